//! End-to-end tests for the offline treepatch commands

mod common;

use anyhow::Result;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tp_core::Tree;

const KEYBOARDS: &str = include_str!("../../core/testdata/keyboards_tree.json");

/// Working copy with the Shan readme edited and a welcome page added
fn shan_workspace() -> Result<TempDir> {
    let dir = TempDir::new()?;
    let root = dir.path();
    fs::create_dir_all(root.join("repo/release/s/shan/source/welcome"))?;
    fs::write(
        root.join("repo/release/s/shan/README.md"),
        "Readme for Shan keyboard\nAddition to readme\n",
    )?;
    fs::write(root.join("repo/release/s/shan/source/shan.kps"), "The KPS file for shan")?;
    fs::write(
        root.join("repo/release/s/shan/source/welcome/welcome.htm"),
        "This is welcome.htm",
    )?;
    fs::write(root.join("previous.json"), KEYBOARDS)?;
    write_changes(
        root,
        r#"[
            {"file": "release/s/shan/README.md", "insertions": 2, "deletions": 1, "binary": false},
            {"file": "release/s/shan/source/welcome/welcome.htm", "insertions": 1, "deletions": 0, "binary": false}
        ]"#,
    )?;
    Ok(dir)
}

fn write_changes(root: &Path, json: &str) -> Result<()> {
    fs::write(root.join("changes.json"), json)?;
    Ok(())
}

#[test]
fn test_help_lists_commands() -> Result<()> {
    let dir = TempDir::new()?;
    let result = tp!(dir.path(), "--help").assert_success()?;

    for command in ["fetch", "classify", "merge", "push", "config"] {
        assert!(result.contains_stdout(command), "help is missing {}", command);
    }
    Ok(())
}

#[test]
fn test_classify_reports_each_change() -> Result<()> {
    let dir = shan_workspace()?;

    let result = tp!(dir.path(), "classify", "--changes", "changes.json", "-C", "repo").assert_success()?;

    assert!(result.contains_stdout("modified"));
    assert!(result.contains_stdout("release/s/shan/README.md"));
    assert!(result.contains_stdout("added"));
    Ok(())
}

#[test]
fn test_classify_fails_on_unclassified_change() -> Result<()> {
    let dir = shan_workspace()?;
    write_changes(
        dir.path(),
        r#"[{"file": "release/s/shan/gone.txt", "insertions": 0, "deletions": 0, "binary": false}]"#,
    )?;

    let result = tp!(dir.path(), "classify", "--changes", "changes.json", "-C", "repo").assert_failure()?;
    assert!(result.contains_stdout("unclassified"));
    Ok(())
}

#[test]
fn test_merge_writes_updated_tree() -> Result<()> {
    let dir = shan_workspace()?;

    tp!(
        dir.path(),
        "merge",
        "--tree",
        "previous.json",
        "--changes",
        "changes.json",
        "--component",
        "shan",
        "-C",
        "repo",
        "-o",
        "merged.json"
    )
    .assert_success()?;

    let previous: Tree = serde_json::from_str(KEYBOARDS)?;
    let merged: Tree = serde_json::from_str(&fs::read_to_string(dir.path().join("merged.json"))?)?;

    assert_eq!(merged.base_tree, previous.sha);
    assert_eq!(merged.sha, None);
    assert_eq!(merged.find("build.sh"), previous.find("build.sh"));
    assert_eq!(merged.find("release/t"), previous.find("release/t"));
    assert_eq!(
        merged.find("release/s/shan/README.md").and_then(|n| n.content()),
        Some("Readme for Shan keyboard\nAddition to readme\n")
    );
    assert!(merged.find("release/s/shan/source/welcome/welcome.htm").is_some());
    Ok(())
}

#[test]
fn test_merge_rejects_changes_outside_scope() -> Result<()> {
    let dir = shan_workspace()?;
    fs::write(dir.path().join("repo/README.md"), "top level")?;
    write_changes(
        dir.path(),
        r#"[
            {"file": "release/s/shan/README.md", "insertions": 2, "deletions": 1, "binary": false},
            {"file": "README.md", "insertions": 1, "deletions": 0, "binary": false}
        ]"#,
    )?;

    let result = tp!(
        dir.path(),
        "merge",
        "--tree",
        "previous.json",
        "--changes",
        "changes.json",
        "--path",
        "release/s/shan",
        "-C",
        "repo",
        "-o",
        "merged.json"
    )
    .assert_failure()?;

    assert!(result.contains_stderr("outside of release/s/shan"));
    assert!(!dir.path().join("merged.json").exists());
    Ok(())
}

#[test]
fn test_config_set_and_get() -> Result<()> {
    let dir = TempDir::new()?;

    tp!(dir.path(), "config", "set", "github.owner", "keymanapp").assert_success()?;
    let result = tp!(dir.path(), "config", "get", "github.owner").assert_success()?;
    assert_eq!(result.stdout.trim(), "keymanapp");
    assert!(dir.path().join("treepatch.toml").exists());

    let result = tp!(dir.path(), "config", "set", "poll.interval_ms", "5").assert_failure()?;
    assert!(result.contains_stderr("interval_ms"));
    Ok(())
}

#[test]
fn test_push_without_repository_fails() -> Result<()> {
    let dir = shan_workspace()?;

    let result = tp!(dir.path(), "push", "--changes", "changes.json", "--component", "shan", "-C", "repo")
        .env("GITHUB_TOKEN", "")
        .assert_failure()?;
    assert!(result.contains_stderr("No repository configured"));
    Ok(())
}
