use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::{Config, LocaleFormat};
use crate::core::candidate::TransformCandidate;
use crate::core::transform::TransformSummary;

/// Default page size of `preview_extraction`.
pub const DEFAULT_PAGE_SIZE: usize = 50;
/// Largest page `preview_extraction` returns.
pub const MAX_PAGE_SIZE: usize = 200;

// ============================================================
// Parameters
// ============================================================

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetConfigParams {
    /// Absolute path of the project root
    pub project_root_path: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetLocalesParams {
    /// Absolute path of the project root
    pub project_root_path: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreviewExtractionParams {
    /// Absolute path of the project root
    pub project_root_path: String,
    /// Index of the first candidate to return (default 0)
    pub offset: Option<u32>,
    /// Maximum number of candidates to return (default 50, max 200)
    pub limit: Option<u32>,
    /// Include unified diffs of source and locale files (default false)
    pub include_diffs: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplyExtractionParams {
    /// Absolute path of the project root
    pub project_root_path: String,
}

// ============================================================
// Config Types (get_config)
// ============================================================

/// Configuration DTO for MCP
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDto {
    /// True if config was loaded from a file, false if using defaults
    pub from_file: bool,
    pub config: ConfigValues,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfigValues {
    pub source_locale: String,
    pub target_locales: Vec<String>,
    pub locales_dir: String,
    pub source_root: String,
    pub includes: Vec<String>,
    pub ignores: Vec<String>,
    pub translatable_attributes: Vec<String>,
    pub key_namespace: String,
    /// `flat`, `nested` or `auto`
    pub locale_format: String,
    pub key_delimiter: String,
    pub migrate_legacy_keys: bool,
    pub scan_translation_calls: bool,
}

impl From<Config> for ConfigValues {
    fn from(c: Config) -> Self {
        let locale_format = match c.locales.format {
            LocaleFormat::Flat => "flat",
            LocaleFormat::Nested => "nested",
            LocaleFormat::Auto => "auto",
        };
        Self {
            source_locale: c.source_locale,
            target_locales: c.target_locales,
            locales_dir: c.locales_dir,
            source_root: c.source_root,
            includes: c.includes,
            ignores: c.ignores,
            translatable_attributes: c.translatable_attributes,
            key_namespace: c.key_generation.namespace,
            locale_format: locale_format.to_string(),
            key_delimiter: c.locales.delimiter,
            migrate_legacy_keys: c.migrate_legacy_keys,
            scan_translation_calls: c.scan_translation_calls,
        }
    }
}

// ============================================================
// Locales Types (get_locales)
// ============================================================

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocalesResult {
    pub locales_dir: String,
    pub source_locale: String,
    pub locales: Vec<LocaleInfo>,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocaleInfo {
    pub locale: String,
    pub file_path: String,
    pub key_count: usize,
}

// ============================================================
// Extraction Types (preview_extraction, apply_extraction)
// ============================================================

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    /// False for a preview; nothing was written.
    pub write: bool,
    pub files_scanned: usize,
    pub files_changed: Vec<String>,
    pub stats: CandidateStatsDto,
    /// Skip counts by reason
    pub skipped_reasons: BTreeMap<String, usize>,
    pub skipped_files: Vec<SkippedFileItem>,
    pub locales: Vec<LocaleChange>,
    pub candidates: Vec<CandidateItem>,
    pub pagination: Pagination,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diffs: Vec<DiffItem>,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CandidateStatsDto {
    pub total: usize,
    pub pending: usize,
    pub existing: usize,
    pub duplicate: usize,
    pub applied: usize,
    pub skipped: usize,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SkippedFileItem {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocaleChange {
    pub locale: String,
    pub file_path: String,
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub total_keys: usize,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CandidateItem {
    pub file_path: String,
    pub line: usize,
    pub column: usize,
    pub kind: String,
    pub text: String,
    pub key: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<&TransformCandidate> for CandidateItem {
    fn from(tc: &TransformCandidate) -> Self {
        Self {
            file_path: tc.candidate.file_path.clone(),
            line: tc.candidate.position.line,
            column: tc.candidate.position.column,
            kind: tc.candidate.kind.to_string(),
            text: tc.candidate.text.clone(),
            key: tc.suggested_key.clone(),
            status: tc.status.to_string(),
            reason: tc.reason.as_ref().map(ToString::to_string),
        }
    }
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiffItem {
    pub path: String,
    pub diff: String,
}

/// Pagination information
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub offset: usize,
    pub limit: usize,
    pub has_more: bool,
}

impl ExtractionResult {
    pub fn from_summary(summary: TransformSummary, offset: usize, limit: usize, with_diffs: bool) -> Self {
        let stats = summary.candidate_stats;
        let total = summary.candidates.len();
        let candidates: Vec<CandidateItem> = summary
            .candidates
            .iter()
            .skip(offset)
            .take(limit)
            .map(CandidateItem::from)
            .collect();
        let has_more = offset + candidates.len() < total;

        let diffs = if with_diffs {
            summary
                .source_diffs
                .into_iter()
                .map(|d| DiffItem {
                    path: d.relative_path,
                    diff: d.diff,
                })
                .chain(summary.diffs.into_iter().map(|d| DiffItem {
                    path: d.path,
                    diff: d.diff,
                }))
                .collect()
        } else {
            Vec::new()
        };

        Self {
            write: summary.write,
            files_scanned: summary.files_scanned,
            files_changed: summary.files_changed,
            stats: CandidateStatsDto {
                total: stats.total,
                pending: stats.pending,
                existing: stats.existing,
                duplicate: stats.duplicate,
                applied: stats.applied,
                skipped: stats.skipped,
            },
            skipped_reasons: summary.skipped_reasons,
            skipped_files: summary
                .skipped_files
                .into_iter()
                .map(|f| SkippedFileItem {
                    path: f.path,
                    reason: f.reason,
                })
                .collect(),
            locales: summary
                .locale_stats
                .into_iter()
                .map(|s| LocaleChange {
                    locale: s.locale,
                    file_path: s.path,
                    added: s.added,
                    updated: s.updated,
                    total_keys: s.total_keys,
                })
                .collect(),
            candidates,
            pagination: Pagination {
                offset,
                limit,
                has_more,
            },
            diffs,
        }
    }
}
