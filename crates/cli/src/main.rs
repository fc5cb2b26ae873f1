//! Treepatch CLI - treepatch command

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cmd;
mod git_diff;
mod system_config;
mod util;

use util::{ChangeSource, RemoteArgs, ScopeArgs};

/// Treepatch - Push local changes onto a remote tree without a clone
#[derive(Parser)]
#[command(name = "treepatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a remote tree, expanded along a path, as JSON
    Fetch {
        /// Root tree hash (default: the tree of the configured branch head)
        tree: Option<String>,

        #[command(flatten)]
        scope: ScopeArgs,

        #[command(flatten)]
        remote: RemoteArgs,

        /// Write the tree to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show how each local change is classified
    Classify {
        #[command(flatten)]
        source: ChangeSource,

        /// Working copy (default: enclosing git repository)
        #[arg(short = 'C', long)]
        repo_dir: Option<PathBuf>,
    },
    /// Merge local changes into a previously fetched tree
    Merge {
        /// Tree JSON produced by `treepatch fetch`
        #[arg(long)]
        tree: PathBuf,

        #[command(flatten)]
        source: ChangeSource,

        #[command(flatten)]
        scope: ScopeArgs,

        /// Working copy (default: enclosing git repository)
        #[arg(short = 'C', long)]
        repo_dir: Option<PathBuf>,

        /// Write the merged tree to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Fetch, merge, write trees, commit and move the branch
    Push {
        #[command(flatten)]
        source: ChangeSource,

        #[command(flatten)]
        scope: ScopeArgs,

        #[command(flatten)]
        remote: RemoteArgs,

        /// Working copy (default: enclosing git repository)
        #[arg(short = 'C', long)]
        repo_dir: Option<PathBuf>,

        /// Commit message
        #[arg(short, long, default_value = "Update via treepatch")]
        message: String,

        /// Move the branch even if the new commit is not a fast-forward
        #[arg(long)]
        force: bool,

        /// Stop after the merge and report what would be written
        #[arg(long)]
        dry_run: bool,

        /// Create the commit but leave the branch where it is
        #[arg(long)]
        no_update_ref: bool,

        /// Wait for the repository to become visible first (fresh forks)
        #[arg(long)]
        wait: bool,
    },
    /// View or edit configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// List all configuration values
    List,

    /// Print one value
    Get {
        /// Key, e.g. github.owner
        key: String,
    },

    /// Set one value
    Set {
        /// Key, e.g. github.owner
        key: String,
        value: String,
    },

    /// Show the config file location
    Path {
        /// Create the file with defaults if missing
        #[arg(long)]
        create: bool,
    },

    /// Print an example configuration
    Example,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Fetch {
            tree,
            scope,
            remote,
            output,
        } => cmd::fetch::run(tree, &scope, &remote, output.as_deref()).await,
        Commands::Classify { source, repo_dir } => cmd::classify::run(&source, repo_dir).await,
        Commands::Merge {
            tree,
            source,
            scope,
            repo_dir,
            output,
        } => cmd::merge::run(&tree, &source, &scope, repo_dir, output.as_deref()).await,
        Commands::Push {
            source,
            scope,
            remote,
            repo_dir,
            message,
            force,
            dry_run,
            no_update_ref,
            wait,
        } => {
            let options = cmd::push::PushOptions {
                message,
                force,
                dry_run,
                update_ref: !no_update_ref,
                wait,
            };
            cmd::push::run(&source, &scope, &remote, repo_dir, options).await
        }
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::List => cmd::config::run_list().await,
            ConfigCommands::Get { key } => cmd::config::run_get(&key).await,
            ConfigCommands::Set { key, value } => cmd::config::run_set(&key, &value).await,
            ConfigCommands::Path { create } => cmd::config::run_path(create).await,
            ConfigCommands::Example => cmd::config::run_example().await,
        },
    }
}
