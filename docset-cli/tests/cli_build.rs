use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::tempdir;

#[test]
fn init_then_build_writes_site() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    #[allow(deprecated)]
    Command::cargo_bin("docset")?
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("docset initialized"));

    #[allow(deprecated)]
    Command::cargo_bin("docset")?
        .current_dir(dir.path())
        .arg("build")
        .assert()
        .success();

    let build = dir.path().join("build");
    let page = fs::read_to_string(build.join("docs/kit/introduction/index.html"))?;
    assert!(page.contains("data-rehype-pretty-code-figure"));
    assert!(!page.contains("prettier-ignore"));
    assert!(build.join("docs/svelte/index.html").exists());
    assert!(build.join("sidebar.json").exists());

    Ok(())
}

#[test]
fn doc_json_outputs_metadata() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    #[allow(deprecated)]
    Command::cargo_bin("docset")?
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    #[allow(deprecated)]
    let assert = Command::cargo_bin("docset")?
        .current_dir(dir.path())
        .args(["doc", "svelte/introduction"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
    let value: Value = serde_json::from_str(&stdout)?;
    assert_eq!(value["metadata"]["slugFull"], "/svelte/introduction");
    assert_eq!(value["metadata"]["category"], "Getting started");
    assert_eq!(value["content"]["headings"][0]["id"], "installation");

    Ok(())
}

#[test]
fn doc_unknown_slug_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    #[allow(deprecated)]
    Command::cargo_bin("docset")?
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    #[allow(deprecated)]
    Command::cargo_bin("docset")?
        .current_dir(dir.path())
        .args(["doc", "svelte/missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No document for slug"));

    Ok(())
}

#[test]
fn verify_json_reports_schema_errors() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let content = dir.path().join("content/svelte");
    fs::create_dir_all(&content)?;
    fs::write(content.join("broken.md"), "---\ntitle: Broken\n---\n")?;
    fs::write(
        dir.path().join("docset.yml"),
        r#"
site:
  title: "Test"
  description: "Desc"
paths:
  content: "content"
  output: "build"
"#,
    )?;

    #[allow(deprecated)]
    let assert = Command::cargo_bin("docset")?
        .current_dir(dir.path())
        .args(["verify", "--json"])
        .assert()
        .failure();

    let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
    let value: Value = serde_json::from_str(&stdout)?;
    assert_eq!(value["errors"], 3);
    let fields: Vec<_> = value["diagnostics"]
        .as_array()
        .expect("diagnostics array")
        .iter()
        .map(|d| d["path"].as_str().unwrap_or_default().to_string())
        .collect();
    assert!(fields.iter().all(|p| p == "svelte/broken"));

    Ok(())
}
