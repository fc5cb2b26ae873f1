//! In-process tree store
//!
//! Behaves like the remote tree API closely enough to drive fetches and
//! submissions without a network: listings are stored one level at a time,
//! writes apply payload entries on top of `base_tree` and assign fresh
//! hashes.

use crate::store::TreeStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tp_core::{BlobPayload, Encoding, FileMode, NodeKind, PatchError, Tree, TreeNode, TreePayload};
use tracing::debug;

#[derive(Debug, Default)]
pub struct MemoryTreeStore {
    trees: Mutex<HashMap<String, Tree>>,
    writes: Mutex<Vec<TreePayload>>,
    blobs: Mutex<Vec<(String, BlobPayload)>>,
    next_sha: AtomicU64,
}

impl MemoryTreeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with a tree and every materialized subtree below it
    pub async fn insert(&self, tree: &Tree) -> Result<(), PatchError> {
        let mut pending = vec![tree.clone()];
        let mut trees = self.trees.lock().await;

        while let Some(mut tree) = pending.pop() {
            let sha = tree
                .sha
                .clone()
                .ok_or_else(|| PatchError::Validation("cannot store a tree without a hash".to_string()))?;
            for node in &mut tree.entries {
                if let NodeKind::Tree { child } = &mut node.kind {
                    if let Some(sub) = child.take() {
                        pending.push(*sub);
                    }
                }
            }
            trees.insert(sha, tree);
        }
        Ok(())
    }

    /// Payloads written so far, in write order
    pub async fn writes(&self) -> Vec<TreePayload> {
        self.writes.lock().await.clone()
    }

    /// Blobs written so far with the hash each was given, in write order
    pub async fn blobs(&self) -> Vec<(String, BlobPayload)> {
        self.blobs.lock().await.clone()
    }

    fn assign_sha(&self) -> String {
        let n = self.next_sha.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{:040x}", n)
    }
}

#[async_trait]
impl TreeStore for MemoryTreeStore {
    async fn read_tree(&self, sha: &str) -> Result<Tree, PatchError> {
        self.trees
            .lock()
            .await
            .get(sha)
            .cloned()
            .ok_or_else(|| PatchError::RemoteFetch(format!("tree {} not found", sha)))
    }

    async fn write_tree(&self, payload: &TreePayload) -> Result<Tree, PatchError> {
        let mut trees = self.trees.lock().await;

        let mut entries: Vec<TreeNode> = match &payload.base_tree {
            Some(base) => trees
                .get(base)
                .ok_or_else(|| PatchError::RemoteFetch(format!("base tree {} not found", base)))?
                .entries
                .clone(),
            None => Vec::new(),
        };

        for item in &payload.tree {
            let position = entries.iter().position(|node| node.path == item.path);

            let node = match (&item.sha, &item.content) {
                (Some(None), _) => {
                    if let Some(i) = position {
                        entries.remove(i);
                    }
                    continue;
                }
                (Some(Some(sha)), _) => {
                    let unchanged = position
                        .map(|i| &entries[i])
                        .is_some_and(|node| node.sha.as_ref() == Some(sha) && node.mode() == item.mode);
                    if unchanged {
                        continue;
                    }
                    let kind = match item.mode {
                        FileMode::Tree => NodeKind::Tree { child: None },
                        FileMode::Submodule => NodeKind::Submodule,
                        mode => NodeKind::Blob {
                            mode,
                            size: 0,
                            content: None,
                            encoding: Encoding::Utf8,
                        },
                    };
                    TreeNode {
                        path: item.path.clone(),
                        sha: Some(sha.clone()),
                        url: None,
                        kind,
                    }
                }
                (None, Some(content)) => TreeNode {
                    path: item.path.clone(),
                    sha: Some(self.assign_sha()),
                    url: None,
                    kind: NodeKind::Blob {
                        mode: item.mode,
                        size: content.len() as u64,
                        content: None,
                        encoding: Encoding::Utf8,
                    },
                },
                (None, None) => {
                    return Err(PatchError::RemoteFetch(format!(
                        "entry '{}' has neither sha nor content",
                        item.path
                    )))
                }
            };

            match position {
                Some(i) => entries[i] = node,
                None => entries.push(node),
            }
        }

        let tree = Tree {
            sha: Some(self.assign_sha()),
            entries,
            ..Default::default()
        };
        debug!("stored tree {:?} with {} entries", tree.sha, tree.entries.len());

        if let Some(sha) = &tree.sha {
            trees.insert(sha.clone(), tree.clone());
        }
        self.writes.lock().await.push(payload.clone());
        Ok(tree)
    }

    async fn write_blob(&self, blob: &BlobPayload) -> Result<String, PatchError> {
        let sha = self.assign_sha();
        debug!("stored {:?} blob {}", blob.encoding, sha);
        self.blobs.lock().await.push((sha.clone(), blob.clone()));
        Ok(sha)
    }
}
