//! Materializing a remote tree along a path
//!
//! The remote hands out one directory level per read. `TreeFetcher` walks down
//! from a root hash, expanding only the directories on the way to the desired
//! path and everything below it, so the merge has complete listings exactly
//! where it will rewrite trees.

use crate::store::TreeStore;
use futures::future::{try_join_all, BoxFuture, FutureExt};
use tp_core::path;
use tp_core::{NodeKind, PatchError, Tree, TreeNode};
use tracing::{debug, info};

pub struct TreeFetcher<'a> {
    store: &'a dyn TreeStore,
}

impl<'a> TreeFetcher<'a> {
    pub fn new(store: &'a dyn TreeStore) -> Self {
        Self { store }
    }

    /// Read `root_sha` and expand every directory on `desired_path`.
    ///
    /// Directories beside the path stay unexpanded. Below the end of the path
    /// the whole subtree is expanded. An empty path expands the entire tree.
    pub async fn materialize(&self, root_sha: &str, desired_path: &str) -> Result<Tree, PatchError> {
        let desired_path = desired_path.trim_matches('/');
        info!("Materializing tree {} along '{}'", root_sha, desired_path);
        self.expand(root_sha, desired_path).await
    }

    fn expand<'b>(&'b self, sha: &'b str, desired_path: &'b str) -> BoxFuture<'b, Result<Tree, PatchError>> {
        async move {
            let listing = self.store.read_tree(sha).await?;
            listing.ensure_complete()?;
            debug!("read tree {} ({} entries)", sha, listing.entries.len());

            let expand_all = desired_path.is_empty();
            let (head, rest) = path::split_first(desired_path);

            let entries = try_join_all(listing.entries.into_iter().map(move |node| async move {
                if !node.is_tree() || !(expand_all || node.path == head) {
                    return Ok::<TreeNode, PatchError>(node);
                }
                let child_sha = node.sha.as_deref().ok_or_else(|| {
                    PatchError::UnsupportedInput(format!("directory '{}' in tree {} has no hash", node.path, sha))
                })?;
                let child = self.expand(child_sha, rest).await?;
                Ok(TreeNode {
                    kind: NodeKind::Tree {
                        child: Some(Box::new(child)),
                    },
                    ..node
                })
            }))
            .await?;

            Ok(Tree {
                entries,
                truncated: false,
                ..listing
            })
        }
        .boxed()
    }
}
