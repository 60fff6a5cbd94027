use keysmith::mcp::{
    KeysmithMcpServer,
    types::{GetConfigParams, GetLocalesParams},
};
use rmcp::handler::server::wrapper::Parameters;
use serde_json::json;

use crate::{McpTestFixture, extract_tool_result_json};

// ============================================================================
// get_config tests
// ============================================================================

#[tokio::test]
async fn test_get_config_defaults() {
    let fixture = McpTestFixture::with_messages(vec![("en", json!({}))]).unwrap();
    let server = KeysmithMcpServer::new();

    let params = Parameters(GetConfigParams {
        project_root_path: fixture.root(),
    });

    let result = server.get_config(params).await.unwrap();
    let json_result = extract_tool_result_json(&result);

    assert_eq!(json_result["config"]["localesDir"], "./messages");
    assert_eq!(json_result["config"]["sourceLocale"], "en");
    assert_eq!(json_result["config"]["localeFormat"], "auto");
    assert!(json_result["config"]["includes"].is_array());
    assert_eq!(json_result["fromFile"], false);
}

#[tokio::test]
async fn test_get_config_from_keysmithrc() {
    let fixture = McpTestFixture::new().unwrap();
    fixture
        .write_config(&json!({
            "localesDir": "locales",
            "sourceLocale": "de",
            "targetLocales": ["en", "fr"],
            "locales": {"format": "flat"}
        }))
        .unwrap();

    let server = KeysmithMcpServer::new();
    let params = Parameters(GetConfigParams {
        project_root_path: fixture.root(),
    });

    let result = server.get_config(params).await.unwrap();
    let json_result = extract_tool_result_json(&result);

    assert_eq!(json_result["fromFile"], true);
    assert_eq!(json_result["config"]["localesDir"], "locales");
    assert_eq!(json_result["config"]["sourceLocale"], "de");
    assert_eq!(json_result["config"]["targetLocales"], json!(["en", "fr"]));
    assert_eq!(json_result["config"]["localeFormat"], "flat");
}

#[tokio::test]
async fn test_get_config_invalid_file_is_an_error() {
    let fixture = McpTestFixture::new().unwrap();
    fixture
        .write_config(&json!({"locales": {"delimiter": ""}}))
        .unwrap();

    let server = KeysmithMcpServer::new();
    let params = Parameters(GetConfigParams {
        project_root_path: fixture.root(),
    });

    assert!(server.get_config(params).await.is_err());
}

// ============================================================================
// get_locales tests
// ============================================================================

#[tokio::test]
async fn test_get_locales_counts_leaf_keys() {
    let fixture = McpTestFixture::with_messages(vec![
        ("en", json!({"common": {"submit": "Submit", "cancel": "Cancel"}, "title": "Home"})),
        ("de", json!({"common": {"submit": "Senden"}})),
    ])
    .unwrap();

    let server = KeysmithMcpServer::new();
    let params = Parameters(GetLocalesParams {
        project_root_path: fixture.root(),
    });

    let result = server.get_locales(params).await.unwrap();
    let json_result = extract_tool_result_json(&result);

    assert_eq!(json_result["sourceLocale"], "en");
    let locales = json_result["locales"].as_array().unwrap();
    assert_eq!(locales.len(), 2);
    assert_eq!(locales[0]["locale"], "de");
    assert_eq!(locales[0]["keyCount"], 1);
    assert_eq!(locales[1]["locale"], "en");
    assert_eq!(locales[1]["keyCount"], 3);
    assert!(
        locales[1]["filePath"]
            .as_str()
            .unwrap()
            .ends_with("messages/en.json")
    );
}

#[tokio::test]
async fn test_get_locales_empty_dir() {
    let fixture = McpTestFixture::new().unwrap();
    let server = KeysmithMcpServer::new();
    let params = Parameters(GetLocalesParams {
        project_root_path: fixture.root(),
    });

    let result = server.get_locales(params).await.unwrap();
    let json_result = extract_tool_result_json(&result);

    assert_eq!(json_result["locales"], json!([]));
}
