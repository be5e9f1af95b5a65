use clap::Parser;
use dgen_cli::{run, Cli};
use dgen_test_utils::{create_design_json, create_login_input};
use pretty_assertions::assert_eq;
use std::path::Path;

fn cli(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("dgen").chain(args.iter().copied())).unwrap()
}

fn write_design(dir: &Path) -> String {
    let path = dir.join("design.json");
    std::fs::write(&path, create_design_json()).unwrap();
    path.to_string_lossy().into_owned()
}

#[tokio::test]
async fn test_render_uses_emergency_strategy() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_design(dir.path());
    let templates = dir.path().join("templates");
    let args = cli(&[
        "render", "--input", &input, "--platform", "jira", "--doc-type", "ticket",
        "--tech-stack", "react", "--json", "--templates", templates.to_str().unwrap(),
    ]);

    let output = run(&args).await.unwrap();
    let document: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(document["strategy_used"], "emergency");
    assert_eq!(document["unresolved_fields"], serde_json::json!([]));
    assert!(document["content"].as_str().unwrap().starts_with("# Login"));
}

#[tokio::test]
async fn test_resolve_reports_custom_default_tier() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom/defaults/ticket.tpl");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "---\nrequired_fields: [title]\n---\n# {{ title }}\n").unwrap();

    let args = cli(&[
        "resolve", "--platform", "jira", "--doc-type", "ticket", "--tech-stack", "cobol",
        "--templates", dir.path().to_str().unwrap(),
    ]);
    let output = run(&args).await.unwrap();
    assert!(output.ends_with("\tcustom/defaults/ticket"), "{output}");
}

#[tokio::test]
async fn test_fingerprint_matches_library() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_design(dir.path());
    let output = run(&cli(&["fingerprint", "--input", &input])).await.unwrap();
    assert_eq!(output, create_login_input().fingerprint().to_string());
}

#[tokio::test]
async fn test_missing_config_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    let args = cli(&[
        "resolve", "--platform", "jira", "--doc-type", "ticket", "--config", missing.to_str().unwrap(),
    ]);
    let err = run(&args).await.unwrap_err();
    assert!(format!("{err:#}").contains("nope.toml"));
}

#[tokio::test]
async fn test_invalid_design_json_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();
    let err = run(&cli(&["fingerprint", "--input", path.to_str().unwrap()])).await.unwrap_err();
    assert!(format!("{err:#}").contains("parsing design extraction"));
}
