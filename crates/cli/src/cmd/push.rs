//! Push local changes to the remote without a clone
//!
//! Reads the branch head, fetches its tree along the scope, merges the local
//! changes, writes the new trees bottom-up, commits and moves the branch.

use crate::system_config;
use crate::util::{self, ChangeSource, RemoteArgs, ScopeArgs};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use remote::{poll_until, GitHubClient, TreeFetcher, TreeSubmitter};
use std::path::PathBuf;
use tp_core::TreeMerger;

#[derive(Debug, Clone)]
pub struct PushOptions {
    pub message: String,
    pub force: bool,
    pub dry_run: bool,
    pub update_ref: bool,
    pub wait: bool,
}

pub async fn run(
    source: &ChangeSource,
    scope: &ScopeArgs,
    remote: &RemoteArgs,
    repo_dir: Option<PathBuf>,
    options: PushOptions,
) -> Result<()> {
    // 1. Configuration and credentials
    let config = system_config::load()?;
    let github = config.github_config(remote.owner.as_deref(), remote.repo.as_deref())?;
    if github.token.is_none() && !options.dry_run {
        anyhow::bail!(
            "No access token found. Set {} (see 'treepatch config get github.token_env')",
            config.github.token_env
        );
    }
    let full_name = format!("{}/{}", github.owner, github.repo);
    let client = GitHubClient::new(github)?;
    let branch = config.github.branch.as_str();

    // 2. Local changes
    let repo_dir = util::resolve_repo_dir(repo_dir)?;
    let scope = scope.resolve()?;
    let changes = util::load_changes(source, &repo_dir).await?;
    if changes.is_empty() {
        println!("{}", "Nothing to push".dimmed());
        return Ok(());
    }

    // 3. Fresh forks take a while to appear
    if options.wait {
        let pb = util::spinner(&format!("Waiting for {} to exist...", full_name));
        let client_ref = &client;
        poll_until(config.poll.interval(), config.poll.max_attempts, move || client_ref.repo_exists())
            .await
            .with_context(|| format!("Repository {} did not appear", full_name))?;
        pb.finish_and_clear();
    }

    // 4. Previous tree, expanded along the scope
    let pb = util::spinner(&format!("Reading {} of {}...", branch, full_name));
    let head = client
        .read_ref(branch)
        .await
        .with_context(|| format!("Failed to read branch {}", branch))?;
    let parent = client
        .read_commit(&head)
        .await
        .with_context(|| format!("Failed to read commit {}", head))?;

    pb.set_message(format!("Fetching tree {}...", parent.tree.sha));
    let previous = TreeFetcher::new(&client)
        .materialize(&parent.tree.sha, &scope)
        .await
        .with_context(|| format!("Failed to fetch tree {}", parent.tree.sha))?;

    // 5. Merge
    pb.set_message(format!("Merging {} change(s)...", changes.len()));
    let merged = TreeMerger::new(&repo_dir)
        .merge(&changes, &previous, &scope)
        .await
        .context("Merge failed")?;
    let (trees, blobs) = util::count_pending(&merged);

    if options.dry_run {
        pb.finish_and_clear();
        println!(
            "{} Dry run: would write {} tree(s) and {} blob(s) on top of {}",
            "✓".green(),
            trees,
            blobs,
            &head[..head.len().min(12)]
        );
        return Ok(());
    }

    // 6. Write trees, commit, move the branch
    pb.set_message(format!("Writing {} tree(s)...", trees));
    let submitted = TreeSubmitter::new(&client)
        .submit(&merged)
        .await
        .context("Failed to write trees")?;
    let root_sha = submitted
        .sha
        .context("Remote did not return a hash for the root tree")?;

    pb.set_message("Creating commit...");
    let commit = client
        .create_commit(&options.message, &root_sha, std::slice::from_ref(&head))
        .await
        .context("Failed to create commit")?;

    if options.update_ref {
        pb.set_message(format!("Updating {}...", branch));
        client
            .update_ref(branch, &commit.sha, options.force)
            .await
            .with_context(|| format!("Failed to move {} to {}", branch, commit.sha))?;
    }
    pb.finish_and_clear();

    println!(
        "{} Pushed {} change(s) to {}",
        "✓".green(),
        changes.len(),
        full_name.cyan()
    );
    println!("  Commit: {}", commit.sha.cyan());
    println!("  Tree:   {}", root_sha.dimmed());
    if options.update_ref {
        println!("  Branch: {}", branch.yellow());
    } else {
        println!("{}", "Branch left unchanged (--no-update-ref)".dimmed());
    }

    Ok(())
}
