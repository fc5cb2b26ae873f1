//! System-wide configuration
//!
//! Stored as TOML at `$XDG_CONFIG_HOME/treepatch/config.toml` (override the
//! location with `TREEPATCH_CONFIG`). Missing keys fall back to defaults; a
//! missing file is the same as an empty one. The access token is never
//! written here, only the name of the environment variable holding it.

use anyhow::{Context, Result};
use remote::github::DEFAULT_API_BASE;
use remote::GitHubConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "TREEPATCH_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SystemConfig {
    pub github: GitHubSection,
    pub poll: PollSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubSection {
    /// REST API base URL
    pub api_base: String,
    /// Owner of the shared repository
    pub owner: String,
    /// Name of the shared repository
    pub repo: String,
    /// Branch that `push` commits onto
    pub branch: String,
    /// Environment variable holding the access token
    pub token_env: String,
}

impl Default for GitHubSection {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            owner: String::new(),
            repo: String::new(),
            branch: "master".to_string(),
            token_env: "GITHUB_TOKEN".to_string(),
        }
    }
}

/// Waiting for a freshly created or forked repository to appear
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSection {
    pub interval_ms: u64,
    pub max_attempts: u32,
}

impl Default for PollSection {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            max_attempts: 300,
        }
    }
}

impl PollSection {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl SystemConfig {
    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        let api_base = &self.github.api_base;
        if !(api_base.starts_with("https://") || api_base.starts_with("http://")) {
            anyhow::bail!("github.api_base must be an http(s) URL, got '{}'", api_base);
        }
        if self.github.branch.is_empty() {
            anyhow::bail!("github.branch must not be empty");
        }
        if self.github.token_env.is_empty() {
            anyhow::bail!("github.token_env must not be empty");
        }
        if !(100..=60_000).contains(&self.poll.interval_ms) {
            anyhow::bail!(
                "poll.interval_ms must be between 100 and 60000, got {}",
                self.poll.interval_ms
            );
        }
        if !(1..=10_000).contains(&self.poll.max_attempts) {
            anyhow::bail!(
                "poll.max_attempts must be between 1 and 10000, got {}",
                self.poll.max_attempts
            );
        }
        Ok(())
    }

    /// Access token from the configured environment variable
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.github.token_env)
            .ok()
            .filter(|token| !token.is_empty())
    }

    /// Client settings, with command-line overrides for owner and repo
    pub fn github_config(&self, owner: Option<&str>, repo: Option<&str>) -> Result<GitHubConfig> {
        let owner = owner.unwrap_or(&self.github.owner);
        let repo = repo.unwrap_or(&self.github.repo);
        if owner.is_empty() || repo.is_empty() {
            anyhow::bail!(
                "No repository configured. Pass --owner/--repo or run \
                 'treepatch config set github.owner <owner>' and 'treepatch config set github.repo <repo>'"
            );
        }

        let mut config = GitHubConfig::new(owner, repo);
        config.api_base = self.github.api_base.clone();
        config.token = self.token();
        Ok(config)
    }
}

/// Location of the config file
pub fn config_file_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("treepatch").join("config.toml"))
}

/// Load the config, falling back to defaults when the file does not exist
pub fn load() -> Result<SystemConfig> {
    let path = match config_file_path() {
        Some(path) if path.exists() => path,
        _ => return Ok(SystemConfig::default()),
    };

    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: SystemConfig = toml::from_str(&text)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;

    Ok(config)
}

pub fn save(config: &SystemConfig) -> Result<()> {
    let path = config_file_path().context("Could not determine config file path")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let text = toml::to_string_pretty(config).context("Failed to serialize configuration")?;
    std::fs::write(&path, text)
        .with_context(|| format!("Failed to write config file {}", path.display()))?;
    Ok(())
}

/// Write a default config file unless one exists; returns its path
pub fn init_if_missing() -> Result<PathBuf> {
    let path = config_file_path().context("Could not determine config file path")?;
    if !path.exists() {
        save(&SystemConfig::default())?;
    }
    Ok(path)
}

pub fn example_config() -> &'static str {
    r#"# treepatch configuration

[github]
api_base = "https://api.github.com"
owner = "keymanapp"
repo = "keyboards"
branch = "master"
# Name of the environment variable holding the access token
token_env = "GITHUB_TOKEN"

[poll]
# Waiting for a new repository to become visible
interval_ms = 1000
max_attempts = 300
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SystemConfig::default();
        config.validate().unwrap();
        assert_eq!(config.github.branch, "master");
        assert_eq!(config.poll.interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: SystemConfig = toml::from_str("[github]\nowner = \"foo\"\n").unwrap();
        assert_eq!(config.github.owner, "foo");
        assert_eq!(config.github.token_env, "GITHUB_TOKEN");
        assert_eq!(config.poll, PollSection::default());
    }

    #[test]
    fn test_example_config_parses() {
        let config: SystemConfig = toml::from_str(example_config()).unwrap();
        config.validate().unwrap();
        assert_eq!(config.github.repo, "keyboards");
    }

    #[test]
    fn test_out_of_range_rejected() {
        let mut config = SystemConfig::default();
        config.poll.interval_ms = 10;
        assert!(config.validate().is_err());

        let mut config = SystemConfig::default();
        config.poll.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = SystemConfig::default();
        config.github.api_base = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_github_config_needs_repository() {
        let config = SystemConfig::default();
        assert!(config.github_config(None, None).is_err());

        let client = config.github_config(Some("foo"), Some("keyboards")).unwrap();
        assert_eq!(client.owner, "foo");
        assert_eq!(client.api_base, DEFAULT_API_BASE);
    }
}
