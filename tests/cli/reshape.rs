use anyhow::Result;
use pretty_assertions::assert_eq;

use crate::{CliTest, stderr, stdout};

#[test]
fn test_reshape_to_nested() -> Result<()> {
    let test = CliTest::new()?;
    test.write_file("messages/en.json", r#"{"home.title": "Welcome", "home.cta": "Start"}"#)?;
    test.write_file("messages/de.json", r#"{"home.title": "Willkommen"}"#)?;

    let output = test.reshape_command().arg("nested").output()?;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Rewrote 2 locale files to nested"));
    assert_eq!(
        test.read_file("messages/de.json")?,
        "{\n  \"home\": {\n    \"title\": \"Willkommen\"\n  }\n}\n"
    );
    Ok(())
}

#[test]
fn test_reshape_to_flat_is_stable() -> Result<()> {
    let test = CliTest::new()?;
    test.write_file("messages/en.json", r#"{"home": {"title": "Welcome"}}"#)?;

    let first = test.reshape_command().arg("flat").output()?;
    assert!(first.status.success(), "stderr: {}", stderr(&first));
    assert_eq!(
        test.read_file("messages/en.json")?,
        "{\n  \"home.title\": \"Welcome\"\n}\n"
    );

    let second = test.reshape_command().arg("flat").output()?;
    assert!(second.status.success());
    assert!(stdout(&second).contains("1 locale file already flat"));
    Ok(())
}
