//! Reading the change list from a local git working copy
//!
//! `git diff --numstat` gives line counts for text files and `-` for binary
//! ones; binary entries are completed with blob sizes from `git cat-file -s`
//! or, for the working copy side, the file on disk.

use anyhow::{Context, Result};
use std::path::Path;
use tokio::process::Command;
use tp_core::FileChange;
use tracing::debug;

/// One record of `git diff --numstat -z`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumstatEntry {
    pub path: String,
    /// `None` for binary files
    pub lines: Option<(u64, u64)>,
}

/// Parse NUL-terminated `--numstat -z` output (renames disabled)
pub fn parse_numstat(output: &str) -> Result<Vec<NumstatEntry>> {
    output
        .split('\0')
        .filter(|record| !record.trim().is_empty())
        .map(|record| {
            let record = record.trim_start_matches('\n');
            let mut fields = record.splitn(3, '\t');
            let (added, deleted, path) = match (fields.next(), fields.next(), fields.next()) {
                (Some(a), Some(d), Some(p)) if !p.is_empty() => (a, d, p),
                _ => anyhow::bail!("Malformed numstat record: {:?}", record),
            };

            let lines = if added == "-" && deleted == "-" {
                None
            } else {
                let added = added
                    .parse()
                    .with_context(|| format!("Bad insertion count in {:?}", record))?;
                let deleted = deleted
                    .parse()
                    .with_context(|| format!("Bad deletion count in {:?}", record))?;
                Some((added, deleted))
            };

            Ok(NumstatEntry {
                path: path.to_string(),
                lines,
            })
        })
        .collect()
}

/// Changes between `base` and `head`, or between `base` and the working copy
/// when `head` is `None`
pub async fn read_changes(repo_dir: &Path, base: &str, head: Option<&str>) -> Result<Vec<FileChange>> {
    let mut args = vec!["diff", "--numstat", "-z", "--no-renames", base];
    if let Some(head) = head {
        args.push(head);
    }
    let numstat = git(repo_dir, &args).await?;
    let entries = parse_numstat(&numstat)?;
    debug!("git diff {} {:?}: {} file(s)", base, head, entries.len());

    let mut changes = Vec::with_capacity(entries.len());
    for entry in entries {
        let change = match entry.lines {
            Some((insertions, deletions)) => FileChange::text(entry.path, insertions, deletions),
            None => {
                let before = blob_size(repo_dir, base, &entry.path).await;
                let after = match head {
                    Some(head) => blob_size(repo_dir, head, &entry.path).await,
                    None => tokio::fs::metadata(repo_dir.join(&entry.path))
                        .await
                        .map(|m| m.len())
                        .unwrap_or(0),
                };
                FileChange::binary(entry.path, before, after)
            }
        };
        changes.push(change);
    }
    Ok(changes)
}

/// Size of `path` at `rev`, 0 when it does not exist there
async fn blob_size(repo_dir: &Path, rev: &str, path: &str) -> u64 {
    let spec = format!("{}:{}", rev, path);
    match git(repo_dir, &["cat-file", "-s", &spec]).await {
        Ok(size) => size.trim().parse().unwrap_or(0),
        Err(e) => {
            debug!("no blob for {}: {:#}", spec, e);
            0
        }
    }
}

async fn git(repo_dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(repo_dir)
        .args(args)
        .output()
        .await
        .context("Failed to run git")?;

    if !output.status.success() {
        anyhow::bail!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    String::from_utf8(output.stdout).context("git produced non-UTF-8 output")
}
