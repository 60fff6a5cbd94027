use std::path::PathBuf;

use anyhow::Result;
use rmcp::{
    ErrorData as McpError, ServerHandler, ServiceExt,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use serde::Serialize;

use crate::config::{ConfigLoadResult, load_config};
use crate::core::locale::{LocaleStore, StoreOptions};
use crate::core::transform::{TransformSummary, Transformer};

use super::types::{
    ApplyExtractionParams, ConfigDto, ConfigValues, DEFAULT_PAGE_SIZE, ExtractionResult,
    GetConfigParams, GetLocalesParams, LocaleInfo, LocalesResult, MAX_PAGE_SIZE,
    PreviewExtractionParams,
};

#[derive(Clone)]
pub struct KeysmithMcpServer {
    tool_router: ToolRouter<Self>,
}

impl Default for KeysmithMcpServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_router]
impl KeysmithMcpServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }

    /// Get the current keysmith configuration
    #[tool(description = "Get the current keysmith configuration.")]
    pub async fn get_config(
        &self,
        params: Parameters<GetConfigParams>,
    ) -> Result<CallToolResult, McpError> {
        let loaded = load_project(&params.0.project_root_path)?;
        json_result(&ConfigDto {
            from_file: loaded.from_file,
            config: ConfigValues::from(loaded.config),
        })
    }

    /// Get available locales and their key counts
    #[tool(description = "Get available locale files and their key counts.")]
    pub async fn get_locales(
        &self,
        params: Parameters<GetLocalesParams>,
    ) -> Result<CallToolResult, McpError> {
        let loaded = load_project(&params.0.project_root_path)?;
        let locales_dir = loaded.root_dir.join(&loaded.config.locales_dir);
        let mut store = LocaleStore::open(&locales_dir, StoreOptions::from_config(&loaded.config));

        let stored = store.get_stored_locales().map_err(|e| {
            McpError::internal_error(format!("Failed to read locales directory: {}", e), None)
        })?;
        let mut locales = Vec::with_capacity(stored.len());
        for locale in stored {
            let key_count = store
                .get(&locale)
                .map_err(|e| McpError::internal_error(e.to_string(), None))?
                .len();
            locales.push(LocaleInfo {
                file_path: store.locale_path(&locale).to_string_lossy().to_string(),
                locale,
                key_count,
            });
        }

        json_result(&LocalesResult {
            locales_dir: locales_dir.to_string_lossy().to_string(),
            source_locale: loaded.config.source_locale,
            locales,
        })
    }

    /// Dry-run extraction
    #[tool(
        description = "Preview extraction without writing anything: generated keys, candidate statuses, skip reasons and locale changes. Candidates are paginated."
    )]
    pub async fn preview_extraction(
        &self,
        params: Parameters<PreviewExtractionParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let limit = params
            .limit
            .map(|v| v as usize)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE);
        let offset = params.offset.map(|v| v as usize).unwrap_or(0);

        let summary = run_extraction(&params.project_root_path, false)?;
        json_result(&ExtractionResult::from_summary(
            summary,
            offset,
            limit,
            params.include_diffs.unwrap_or(false),
        ))
    }

    /// Apply extraction
    #[tool(
        description = "Rewrite hardcoded text to translation calls and update locale files. Run preview_extraction first."
    )]
    pub async fn apply_extraction(
        &self,
        params: Parameters<ApplyExtractionParams>,
    ) -> Result<CallToolResult, McpError> {
        let summary = run_extraction(&params.0.project_root_path, true)?;
        let total = summary.candidates.len();
        json_result(&ExtractionResult::from_summary(summary, 0, total, false))
    }
}

#[tool_handler]
impl ServerHandler for KeysmithMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Keysmith MCP moves hardcoded UI text into translation keys.\n\n\
                 Available tools:\n\
                 1. get_config - Get project configuration\n\
                 2. get_locales - Get locale files and their key counts\n\
                 3. preview_extraction - Dry run: generated keys, skips and locale changes (paginated)\n\
                 4. apply_extraction - Rewrite source files and update locale files\n\n\
                 Recommended Workflow:\n\
                 1. Call preview_extraction and review the generated keys and skipped candidates\n\
                 2. Call apply_extraction\n\
                 3. Translate the new keys in the target locale files"
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

fn load_project(path: &str) -> Result<ConfigLoadResult, McpError> {
    let root = PathBuf::from(path);
    let root = root.canonicalize().unwrap_or(root);
    load_config(&root)
        .map_err(|e| McpError::internal_error(format!("Failed to load config: {:#}", e), None))
}

fn run_extraction(path: &str, write: bool) -> Result<TransformSummary, McpError> {
    let loaded = load_project(path)?;
    Transformer::new(&loaded.config, &loaded.root_dir)
        .run(write)
        .map_err(|e| McpError::internal_error(format!("Extraction failed: {:#}", e), None))
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json_str = serde_json::to_string_pretty(value).map_err(|e| {
        McpError::internal_error(format!("JSON serialization failed: {}", e), None)
    })?;
    Ok(CallToolResult::success(vec![Content::text(json_str)]))
}

/// Entry point for MCP server
pub fn run_server() -> Result<()> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(async {
            let service = KeysmithMcpServer::new();
            let server = service.serve(rmcp::transport::stdio()).await?;
            server.waiting().await?;
            Ok(())
        })
}
