//! Show how each local change is classified

use crate::util::{self, ChangeSource};
use anyhow::Result;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use tp_core::{ChangeClassifier, PatchError};

pub async fn run(source: &ChangeSource, repo_dir: Option<PathBuf>) -> Result<()> {
    let repo_dir = util::resolve_repo_dir(repo_dir)?;
    let changes = util::load_changes(source, &repo_dir).await?;

    if changes.is_empty() {
        println!("{}", "No changes".dimmed());
        return Ok(());
    }

    let classifier = ChangeClassifier::new(&repo_dir);
    let mut unclassified = 0;

    for change in &changes {
        match classifier.classify(change) {
            Ok(kind) => println!("  {:<20} {}", util::format_kind(kind), change.path),
            Err(PatchError::UnclassifiedChange { .. }) => {
                unclassified += 1;
                println!("  {:<20} {}", "unclassified".red().bold().to_string(), change.path);
            }
            Err(e) => return Err(e.into()),
        }
    }

    if unclassified > 0 {
        anyhow::bail!("{} change(s) could not be classified", unclassified);
    }

    Ok(())
}
