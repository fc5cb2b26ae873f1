//! Fetch a remote tree expanded along a path

use crate::system_config;
use crate::util::{self, RemoteArgs, ScopeArgs};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use remote::{GitHubClient, TreeFetcher};
use std::path::Path;

pub async fn run(
    tree: Option<String>,
    scope: &ScopeArgs,
    remote: &RemoteArgs,
    output: Option<&Path>,
) -> Result<()> {
    let config = system_config::load()?;
    let client = GitHubClient::new(config.github_config(remote.owner.as_deref(), remote.repo.as_deref())?)?;
    let scope = scope.resolve()?;

    let pb = util::spinner("Resolving root tree...");
    let root_sha = match tree {
        Some(sha) => sha,
        None => {
            let branch = &config.github.branch;
            let head = client
                .read_ref(branch)
                .await
                .with_context(|| format!("Failed to read branch {}", branch))?;
            client
                .read_commit(&head)
                .await
                .with_context(|| format!("Failed to read commit {}", head))?
                .tree
                .sha
        }
    };

    pb.set_message(format!("Fetching {} along '{}'...", root_sha, scope));
    let fetched = TreeFetcher::new(&client)
        .materialize(&root_sha, &scope)
        .await
        .with_context(|| format!("Failed to fetch tree {}", root_sha))?;
    pb.finish_and_clear();

    util::write_tree(&fetched, output).await?;
    if let Some(file) = output {
        println!(
            "{} Fetched tree {} into {}",
            "✓".green(),
            root_sha.cyan(),
            file.display()
        );
    }

    Ok(())
}
