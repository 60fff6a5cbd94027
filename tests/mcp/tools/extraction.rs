use keysmith::mcp::{
    KeysmithMcpServer,
    types::{ApplyExtractionParams, PreviewExtractionParams},
};
use rmcp::handler::server::wrapper::Parameters;
use serde_json::json;

use crate::{McpTestFixture, extract_tool_result_json};

const FORM: &str = r#"export function Form() {
  return (
    <form>
      <h1>Sign in</h1>
      <input placeholder="Email address" />
      <button>Continue</button>
    </form>
  );
}
"#;

fn preview(fixture: &McpTestFixture, offset: Option<u32>, limit: Option<u32>) -> PreviewExtractionParams {
    PreviewExtractionParams {
        project_root_path: fixture.root(),
        offset,
        limit,
        include_diffs: None,
    }
}

#[tokio::test]
async fn test_preview_extraction_writes_nothing() {
    let fixture = McpTestFixture::new().unwrap();
    fixture.write_source_file("src/components/Form.tsx", FORM).unwrap();

    let server = KeysmithMcpServer::new();
    let result = server
        .preview_extraction(Parameters(preview(&fixture, None, None)))
        .await
        .unwrap();
    let json_result = extract_tool_result_json(&result);

    assert_eq!(json_result["write"], false);
    assert_eq!(json_result["filesScanned"], 1);
    assert_eq!(json_result["stats"]["total"], 3);
    assert_eq!(json_result["candidates"][0]["key"], "form.sign_in");
    assert_eq!(json_result["candidates"][0]["line"], 4);
    assert_eq!(json_result["locales"][0]["added"].as_array().unwrap().len(), 3);
    assert!(json_result.get("diffs").is_none());

    assert_eq!(fixture.read_source_file("src/components/Form.tsx").unwrap(), FORM);
    assert!(!fixture.root_path().join("messages/en.json").exists());
}

#[tokio::test]
async fn test_preview_extraction_pagination() {
    let fixture = McpTestFixture::new().unwrap();
    fixture.write_source_file("src/components/Form.tsx", FORM).unwrap();
    let server = KeysmithMcpServer::new();

    let first = server
        .preview_extraction(Parameters(preview(&fixture, Some(0), Some(2))))
        .await
        .unwrap();
    let first = extract_tool_result_json(&first);
    assert_eq!(first["candidates"].as_array().unwrap().len(), 2);
    assert_eq!(first["pagination"]["hasMore"], true);

    let second = server
        .preview_extraction(Parameters(preview(&fixture, Some(2), Some(2))))
        .await
        .unwrap();
    let second = extract_tool_result_json(&second);
    assert_eq!(second["candidates"].as_array().unwrap().len(), 1);
    assert_eq!(second["candidates"][0]["text"], "Continue");
    assert_eq!(second["pagination"]["hasMore"], false);
}

#[tokio::test]
async fn test_preview_extraction_with_diffs() {
    let fixture = McpTestFixture::new().unwrap();
    fixture.write_source_file("src/components/Form.tsx", FORM).unwrap();
    let server = KeysmithMcpServer::new();

    let mut params = preview(&fixture, None, None);
    params.include_diffs = Some(true);
    let result = server.preview_extraction(Parameters(params)).await.unwrap();
    let json_result = extract_tool_result_json(&result);

    let diffs = json_result["diffs"].as_array().unwrap();
    assert_eq!(diffs.len(), 2);
    assert_eq!(diffs[0]["path"], "src/components/Form.tsx");
    assert!(diffs[0]["diff"].as_str().unwrap().contains("+      <h1>{t(\"form.sign_in\")}</h1>"));
}

#[tokio::test]
async fn test_apply_extraction_updates_files() {
    let fixture = McpTestFixture::with_messages(vec![("en", json!({}))]).unwrap();
    fixture
        .write_source_file(
            "src/components/Card.vue",
            "<template>\n  <h2>Card title</h2>\n</template>\n",
        )
        .unwrap();

    let server = KeysmithMcpServer::new();
    let result = server
        .apply_extraction(Parameters(ApplyExtractionParams {
            project_root_path: fixture.root(),
        }))
        .await
        .unwrap();
    let json_result = extract_tool_result_json(&result);

    assert_eq!(json_result["write"], true);
    assert_eq!(json_result["stats"]["applied"], 1);
    assert_eq!(json_result["filesChanged"], json!(["src/components/Card.vue"]));

    let card = fixture.read_source_file("src/components/Card.vue").unwrap();
    assert!(card.contains("<h2>{{ $t('card.card_title') }}</h2>"));
    let en = fixture.read_locale_file("en").unwrap();
    assert_eq!(en["card"]["card_title"], "Card title");
}

#[tokio::test]
async fn test_apply_extraction_twice_changes_nothing() {
    let fixture = McpTestFixture::new().unwrap();
    fixture.write_source_file("src/components/Form.tsx", FORM).unwrap();
    let server = KeysmithMcpServer::new();
    let params = || {
        Parameters(ApplyExtractionParams {
            project_root_path: fixture.root(),
        })
    };

    server.apply_extraction(params()).await.unwrap();
    let second = server.apply_extraction(params()).await.unwrap();
    let second = extract_tool_result_json(&second);

    assert_eq!(second["stats"]["total"], 0);
    assert_eq!(second["filesChanged"], json!([]));
    assert_eq!(second["locales"], json!([]));
}
