use anyhow::Result;
use pretty_assertions::assert_eq;
use serde_json::Value;

use crate::{CliTest, stderr, stdout};

const HELLO: &str = r#"export function Hello() {
  return <p>Hello world</p>;
}
"#;

#[test]
fn test_extract_dry_run_reports_pending_changes() -> Result<()> {
    let test = CliTest::with_file("src/components/Hello.tsx", HELLO)?;

    let output = test.extract_command().output()?;
    let out = stdout(&output);

    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr(&output));
    assert!(out.contains("+++ b/src/components/Hello.tsx"));
    assert!(out.contains("+  return <p>{t(\"hello.hello_world\")}</p>;"));
    assert!(out.contains("Would extract 1 text(s) in 1 file, 1 locale file"));
    assert!(out.contains("Run with --apply to apply these changes."));

    // Nothing written.
    assert_eq!(test.read_file("src/components/Hello.tsx")?, HELLO);
    assert!(!test.root().join("messages/en.json").exists());
    Ok(())
}

#[test]
fn test_extract_apply_rewrites_source_and_locale() -> Result<()> {
    let test = CliTest::with_file("src/components/Hello.tsx", HELLO)?;

    let output = test.extract_command().arg("--apply").output()?;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Extracted 1 text(s) in 1 file, updated 1 locale file"));

    let source = test.read_file("src/components/Hello.tsx")?;
    assert_eq!(
        source,
        r#"import { useTranslations } from "next-intl";
export function Hello() {
  const t = useTranslations();
  return <p>{t("hello.hello_world")}</p>;
}
"#
    );
    assert_eq!(
        test.read_file("messages/en.json")?,
        "{\n  \"hello\": {\n    \"hello_world\": \"Hello world\"\n  }\n}\n"
    );
    Ok(())
}

#[test]
fn test_extract_is_idempotent() -> Result<()> {
    let test = CliTest::with_file(
        "src/components/Card.vue",
        "<template>\n  <div>\n    <h2>Card title</h2>\n    <img alt=\"Company logo\">\n  </div>\n</template>\n",
    )?;

    let first = test.extract_command().arg("--apply").output()?;
    assert!(first.status.success(), "stderr: {}", stderr(&first));
    let card = test.read_file("src/components/Card.vue")?;
    let en = test.read_file("messages/en.json")?;

    let second = test.extract_command().output()?;
    assert!(second.status.success(), "stderr: {}", stderr(&second));
    assert!(stdout(&second).contains("nothing to extract"));
    assert_eq!(test.read_file("src/components/Card.vue")?, card);
    assert_eq!(test.read_file("messages/en.json")?, en);
    Ok(())
}

#[test]
fn test_extract_duplicate_text_shares_one_key() -> Result<()> {
    let test = CliTest::with_file(
        "src/components/Form.tsx",
        r#"export function Form() {
  return (
    <div>
      <input placeholder="Enter name" />
      <p>Enter name</p>
    </div>
  );
}
"#,
    )?;

    let output = test.extract_command().arg("--apply").output()?;
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("duplicate: 1"));

    let source = test.read_file("src/components/Form.tsx")?;
    assert_eq!(source.matches("t(\"form.enter_name\")").count(), 2);
    let en: Value = serde_json::from_str(&test.read_file("messages/en.json")?)?;
    assert_eq!(en.as_object().map(|m| m.len()), Some(1));
    Ok(())
}

#[test]
fn test_extract_resolves_parent_leaf_collision() -> Result<()> {
    let test = CliTest::new()?;
    test.write_file(".keysmithrc.json", r#"{"keyGeneration": {"namespace": "a"}}"#)?;
    test.write_file("messages/en.json", r#"{"a": {"b": "Existing"}}"#)?;
    test.write_file(
        "src/components/b.tsx",
        "export function B() {\n  return <p>C</p>;\n}\n",
    )?;

    let output = test.extract_command().arg("--apply").output()?;
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    assert!(test.read_file("src/components/b.tsx")?.contains("t(\"a.b_c\")"));
    let en: Value = serde_json::from_str(&test.read_file("messages/en.json")?)?;
    assert_eq!(en["a"]["b"], "Existing");
    assert_eq!(en["a"]["b_c"], "C");
    Ok(())
}

#[test]
fn test_extract_json_output() -> Result<()> {
    let test = CliTest::with_file("src/components/Hello.tsx", HELLO)?;

    let output = test.extract_command().arg("--json").output()?;
    let summary: Value = serde_json::from_str(&stdout(&output))?;

    assert_eq!(summary["write"], false);
    assert_eq!(summary["filesScanned"], 1);
    assert_eq!(summary["candidates"][0]["suggestedKey"], "hello.hello_world");
    assert_eq!(summary["candidates"][0]["status"], "applied");
    assert_eq!(summary["candidateStats"]["applied"], 1);
    Ok(())
}

#[test]
fn test_extract_reports_skipped_candidate() -> Result<()> {
    let test = CliTest::with_file(
        "src/components/Mode.tsx",
        "export function Mode({ on }) {\n  return <p>{on ? \"Enabled\" : \"Disabled\"}</p>;\n}\n",
    )?;

    let output = test.extract_command().arg("--apply").output()?;
    let out = stdout(&output);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(out.contains("unsafe-expression"));
    assert!(out.contains("--> src/components/Mode.tsx:2:"));
    assert!(out.contains("skipped: 1"));
    Ok(())
}

#[test]
fn test_extract_unparsable_file_fails() -> Result<()> {
    let test = CliTest::with_file("src/components/Broken.tsx", "export function {\n")?;

    let output = test.extract_command().arg("--apply").output()?;

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("1 file(s) could not be processed"));
    Ok(())
}

#[test]
fn test_extract_cli_overrides_locales_dir() -> Result<()> {
    let test = CliTest::with_file("src/components/Hello.tsx", HELLO)?;

    let output = test
        .extract_command()
        .args(["--apply", "--locales-dir", "i18n", "--source-locale", "fr"])
        .output()?;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(test.root().join("i18n/fr.json").exists());
    assert!(!test.root().join("messages").exists());
    Ok(())
}

#[test]
fn test_extract_invalid_config_is_an_error() -> Result<()> {
    let test = CliTest::with_file(".keysmithrc.json", r#"{"locales": {"delimiter": ""}}"#)?;

    let output = test.extract_command().output()?;

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Error:"));
    Ok(())
}
