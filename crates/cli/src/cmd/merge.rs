//! Merge local changes into a previously fetched tree, offline

use crate::util::{self, ChangeSource, ScopeArgs};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use tp_core::TreeMerger;

pub async fn run(
    tree_file: &Path,
    source: &ChangeSource,
    scope: &ScopeArgs,
    repo_dir: Option<PathBuf>,
    output: Option<&Path>,
) -> Result<()> {
    let repo_dir = util::resolve_repo_dir(repo_dir)?;
    let scope = scope.resolve()?;
    let previous = util::read_tree_file(tree_file).await?;
    let changes = util::load_changes(source, &repo_dir).await?;

    let merged = TreeMerger::new(&repo_dir)
        .merge(&changes, &previous, &scope)
        .await
        .context("Merge failed")?;

    util::write_tree(&merged, output).await?;
    if let Some(file) = output {
        let (trees, blobs) = util::count_pending(&merged);
        println!(
            "{} Merged {} change(s) into {}: {} tree(s) and {} blob(s) to write",
            "✓".green(),
            changes.len(),
            file.display(),
            trees,
            blobs
        );
    }

    Ok(())
}
