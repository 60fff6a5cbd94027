use anyhow::{Context, Result};
use serde_json::Value;

use crate::{CliTest, stderr, stdout};

#[test]
fn test_init_creates_config() -> Result<()> {
    let test = CliTest::new()?;

    let output = test.command().arg("init").output()?;
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Created .keysmithrc.json"));

    let content = test.read_file(".keysmithrc.json")?;
    let parsed: Value = serde_json::from_str(&content).context("Config should be valid JSON")?;
    assert_eq!(parsed["sourceLocale"], "en");
    assert_eq!(parsed["localesDir"], "./messages");
    assert!(parsed["includes"].is_array());
    assert!(content.contains("\n  \""), "Config should use 2-space indentation");
    Ok(())
}

#[test]
fn test_init_fails_if_exists() -> Result<()> {
    let test = CliTest::with_file(".keysmithrc.json", "{}")?;

    let output = test.command().arg("init").output()?;

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains(".keysmithrc.json already exists"));
    assert_eq!(test.read_file(".keysmithrc.json")?, "{}");
    Ok(())
}

#[test]
fn test_init_config_is_immediately_usable() -> Result<()> {
    let test = CliTest::new()?;
    test.command().arg("init").output()?;
    test.write_file(
        "src/app/page.tsx",
        "export default function Page() {\n  return <div>Test</div>;\n}\n",
    )?;

    let output = test.command().args(["extract", "--apply"]).output()?;
    assert!(
        output.status.success(),
        "extract should work with initialized config. stderr: {}",
        stderr(&output)
    );
    assert!(test.read_file("messages/en.json")?.contains("\"Test\""));
    Ok(())
}
