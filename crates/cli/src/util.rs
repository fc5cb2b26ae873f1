//! Shared utilities for CLI commands

use crate::git_diff;
use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tp_core::{ChangeKind, FileChange, Tree};

/// Where the change list comes from
#[derive(Args, Debug, Clone)]
pub struct ChangeSource {
    /// JSON file with change records instead of running git diff
    #[arg(long, value_name = "FILE")]
    pub changes: Option<PathBuf>,

    /// Revision to diff from
    #[arg(long, default_value = "HEAD")]
    pub base: String,

    /// Revision to diff to (default: the working copy)
    #[arg(long)]
    pub head: Option<String>,
}

/// Target sub-path of the merge
#[derive(Args, Debug, Clone)]
pub struct ScopeArgs {
    /// Repository-relative directory the changes must lie in
    #[arg(long, conflicts_with = "component")]
    pub path: Option<String>,

    /// Component name, mapped to release/<first letter>/<name>
    #[arg(long)]
    pub component: Option<String>,
}

impl ScopeArgs {
    /// Resolve to a scope path; empty means the whole repository
    pub fn resolve(&self) -> Result<String> {
        match (&self.path, &self.component) {
            (Some(path), _) => Ok(tp_core::path::normalize_scope(path).to_string()),
            (None, Some(component)) => Ok(tp_core::path::component_path(component)?),
            (None, None) => Ok(String::new()),
        }
    }
}

/// Repository on the remote, overriding the configured one
#[derive(Args, Debug, Clone, Default)]
pub struct RemoteArgs {
    #[arg(long)]
    pub owner: Option<String>,

    #[arg(long)]
    pub repo: Option<String>,
}

/// Find repository root by walking up from cwd to find .git/
pub fn find_repo_root() -> Result<PathBuf> {
    let mut current = std::env::current_dir().context("Failed to get current directory")?;

    loop {
        if current.join(".git").exists() {
            return Ok(current);
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => anyhow::bail!("Not a git repository (no .git directory found)"),
        }
    }
}

/// Working copy to read from: the explicit directory or the enclosing repository
pub fn resolve_repo_dir(repo_dir: Option<PathBuf>) -> Result<PathBuf> {
    match repo_dir {
        Some(dir) => Ok(dir),
        None => find_repo_root(),
    }
}

pub async fn load_changes(source: &ChangeSource, repo_dir: &Path) -> Result<Vec<FileChange>> {
    match &source.changes {
        Some(file) => {
            let text = tokio::fs::read_to_string(file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse change records in {}", file.display()))
        }
        None => git_diff::read_changes(repo_dir, &source.base, source.head.as_deref())
            .await
            .context("Failed to read changes from git"),
    }
}

pub async fn read_tree_file(file: &Path) -> Result<Tree> {
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse tree in {}", file.display()))
}

/// Write `tree` as JSON to `output`, or to stdout
pub async fn write_tree(tree: &Tree, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(tree).context("Failed to serialize tree")?;
    match output {
        Some(file) => tokio::fs::write(file, json)
            .await
            .with_context(|| format!("Failed to write {}", file.display())),
        None => {
            println!("{}", json);
            Ok(())
        }
    }
}

pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub fn format_kind(kind: ChangeKind) -> String {
    match kind {
        ChangeKind::Added => "added".green().to_string(),
        ChangeKind::Modified => "modified".yellow().to_string(),
        ChangeKind::Deleted => "deleted".red().to_string(),
    }
}

/// Count the trees and blobs a submission will create
pub fn count_pending(tree: &Tree) -> (usize, usize) {
    let mut trees = usize::from(tree.sha.is_none());
    let mut blobs = 0;
    for node in &tree.entries {
        if node.sha.is_some() {
            continue;
        }
        match node.child() {
            Some(child) => {
                let (t, b) = count_pending(child);
                trees += t;
                blobs += b;
            }
            None => blobs += 1,
        }
    }
    (trees, blobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tp_core::{FileMode, TreeNode};

    #[test]
    fn test_scope_resolution() {
        let scope = ScopeArgs {
            path: Some("release/s/shan/".to_string()),
            component: None,
        };
        assert_eq!(scope.resolve().unwrap(), "release/s/shan");

        let scope = ScopeArgs {
            path: None,
            component: Some("shan".to_string()),
        };
        assert_eq!(scope.resolve().unwrap(), "release/s/shan");

        let scope = ScopeArgs {
            path: None,
            component: None,
        };
        assert_eq!(scope.resolve().unwrap(), "");
    }

    #[test]
    fn test_count_pending() {
        let welcome = Tree {
            entries: vec![TreeNode::new_blob("welcome.htm", FileMode::File, "hi".to_string())],
            ..Default::default()
        };
        let root = Tree {
            base_tree: Some("abc".to_string()),
            entries: vec![
                TreeNode::new_blob("README.md", FileMode::File, "x".to_string()),
                TreeNode::with_subtree("welcome", None, None, welcome),
            ],
            ..Default::default()
        };
        assert_eq!(count_pending(&root), (2, 2));
    }
}
