//! GitHub git-data API client
//!
//! Implements [`TreeStore`] against `/repos/{owner}/{repo}/git/trees` and
//! `git/blobs`, and adds the commit and ref calls needed to publish a written
//! tree.

use crate::store::TreeStore;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tp_core::{BlobPayload, PatchError, Tree, TreePayload};
use tracing::debug;

/// Default GitHub REST API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const USER_AGENT: &str = concat!("treepatch/", env!("CARGO_PKG_VERSION"));

/// Connection settings for one repository
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub api_base: String,
    pub owner: String,
    pub repo: String,
    /// Sent as a bearer token when present
    pub token: Option<String>,
}

impl GitHubConfig {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            owner: owner.into(),
            repo: repo.into(),
            token: None,
        }
    }
}

/// A commit as the git-data API reports it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommitInfo {
    pub sha: String,
    pub tree: ObjectRef,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub parents: Vec<ObjectRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObjectRef {
    pub sha: String,
}

#[derive(Debug, Serialize)]
struct CreateCommitRequest<'a> {
    message: &'a str,
    tree: &'a str,
    parents: &'a [String],
}

#[derive(Debug, Serialize)]
struct UpdateRefRequest<'a> {
    sha: &'a str,
    force: bool,
}

#[derive(Debug, Deserialize)]
struct RefResponse {
    object: ObjectRef,
}

pub struct GitHubClient {
    client: Client,
    config: GitHubConfig,
}

impl GitHubClient {
    pub fn new(config: GitHubConfig) -> Result<Self, PatchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| PatchError::RemoteFetch(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    fn repo_url(&self) -> String {
        format!(
            "{}/repos/{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.owner,
            self.config.repo
        )
    }

    fn git_url(&self, suffix: &str) -> String {
        format!("{}/git/{}", self.repo_url(), suffix)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header("Accept", "application/vnd.github+json");
        match &self.config.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder, url: &str) -> Result<T, PatchError> {
        let response = builder
            .send()
            .await
            .map_err(|e| PatchError::RemoteFetch(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PatchError::RemoteFetch(format!(
                "{url} returned HTTP {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| PatchError::RemoteFetch(format!("failed to parse response from {url}: {e}")))
    }

    pub async fn read_commit(&self, sha: &str) -> Result<CommitInfo, PatchError> {
        let url = self.git_url(&format!("commits/{sha}"));
        debug!("GET {}", url);
        self.send(self.request(Method::GET, &url), &url).await
    }

    pub async fn create_commit(&self, message: &str, tree: &str, parents: &[String]) -> Result<CommitInfo, PatchError> {
        let url = self.git_url("commits");
        debug!("POST {} (tree {})", url, tree);
        let body = CreateCommitRequest {
            message,
            tree,
            parents,
        };
        self.send(self.request(Method::POST, &url).json(&body), &url).await
    }

    /// Commit hash a branch currently points at
    pub async fn read_ref(&self, branch: &str) -> Result<String, PatchError> {
        let url = self.git_url(&format!("ref/heads/{branch}"));
        debug!("GET {}", url);
        let head: RefResponse = self.send(self.request(Method::GET, &url), &url).await?;
        Ok(head.object.sha)
    }

    pub async fn update_ref(&self, branch: &str, sha: &str, force: bool) -> Result<(), PatchError> {
        let url = self.git_url(&format!("refs/heads/{branch}"));
        debug!("PATCH {} -> {}", url, sha);
        let _: RefResponse = self
            .send(self.request(Method::PATCH, &url).json(&UpdateRefRequest { sha, force }), &url)
            .await?;
        Ok(())
    }

    /// Whether the repository is visible yet.
    ///
    /// Any failure counts as "not yet"; pair with [`crate::poll_until`].
    pub async fn repo_exists(&self) -> bool {
        let url = self.repo_url();
        match self.request(Method::GET, &url).send().await {
            Ok(response) => {
                let status = response.status();
                if status != StatusCode::NOT_FOUND && !status.is_success() {
                    debug!("{} returned HTTP {}", url, status);
                }
                status.is_success()
            }
            Err(e) => {
                debug!("request to {} failed: {}", url, e);
                false
            }
        }
    }
}

#[async_trait]
impl TreeStore for GitHubClient {
    async fn read_tree(&self, sha: &str) -> Result<Tree, PatchError> {
        let url = self.git_url(&format!("trees/{sha}"));
        debug!("GET {}", url);
        self.send(self.request(Method::GET, &url), &url).await
    }

    async fn write_tree(&self, payload: &TreePayload) -> Result<Tree, PatchError> {
        let url = self.git_url("trees");
        debug!("POST {} ({} entries)", url, payload.tree.len());
        self.send(self.request(Method::POST, &url).json(payload), &url).await
    }

    async fn write_blob(&self, blob: &BlobPayload) -> Result<String, PatchError> {
        let url = self.git_url("blobs");
        debug!("POST {} ({:?}, {} bytes)", url, blob.encoding, blob.content.len());
        let created: ObjectRef = self.send(self.request(Method::POST, &url).json(blob), &url).await?;
        Ok(created.sha)
    }
}
