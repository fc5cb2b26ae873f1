//! Writing a merged tree back to the remote

use crate::store::TreeStore;
use futures::future::{try_join, try_join_all, BoxFuture, FutureExt};
use std::collections::HashMap;
use tp_core::{BlobPayload, Encoding, NodeKind, PatchError, Tree, TreeNode, TreePayload};
use tracing::{debug, info};

/// Writes every tree without a hash, deepest first.
///
/// A parent can only be written once its touched subtrees and binary blobs
/// have hashes, so each level waits for them. Sibling subtrees and blobs are
/// written concurrently.
pub struct TreeSubmitter<'a> {
    store: &'a dyn TreeStore,
}

impl<'a> TreeSubmitter<'a> {
    pub fn new(store: &'a dyn TreeStore) -> Self {
        Self { store }
    }

    /// Submit `tree` and return it with every hash the remote assigned.
    ///
    /// New blobs come back with `sha` and `url` set and their inline content
    /// dropped. Materialized subtrees stay attached.
    pub async fn submit(&self, tree: &Tree) -> Result<Tree, PatchError> {
        info!("Submitting tree (base {})", tree.base_tree.as_deref().unwrap_or("<none>"));
        let written = self.write_level(tree, "").await?;
        info!("Remote assigned root tree {}", written.sha.as_deref().unwrap_or("<none>"));
        Ok(written)
    }

    fn write_level<'b>(&'b self, tree: &'b Tree, current_path: &'b str) -> BoxFuture<'b, Result<Tree, PatchError>> {
        async move {
            if tree.sha.is_some() {
                return Ok(tree.clone());
            }

            let pending: Vec<&TreeNode> = tree
                .entries
                .iter()
                .filter(|node| node.is_tree() && node.sha.is_none())
                .collect();
            let binaries: Vec<(&str, BlobPayload)> = tree
                .entries
                .iter()
                .filter(|node| node.sha.is_none() && node.encoding() == Encoding::Base64)
                .filter_map(|node| BlobPayload::from_node(node).map(|blob| (node.path.as_str(), blob)))
                .collect();

            let subtrees = try_join_all(pending.into_iter().map(move |node| async move {
                let node_path = tp_core::path::join(current_path, &node.path);
                let child = node.child().ok_or_else(|| {
                    PatchError::Validation(format!("directory {} has neither a hash nor a listing", node_path))
                })?;
                let child = self.write_level(child, &node_path).await?;
                Ok::<_, PatchError>((node.path.clone(), child))
            }));
            let blobs = try_join_all(binaries.iter().map(move |(name, blob)| async move {
                let sha = self.store.write_blob(blob).await?;
                debug!("wrote blob '{}' as {}", tp_core::path::join(current_path, name), sha);
                Ok::<_, PatchError>((name.to_string(), sha))
            }));
            let (written, blobs) = try_join(subtrees, blobs).await?;

            let mut staged = tree.clone();
            for (name, child) in written {
                if let Some(node) = staged.entries.iter_mut().find(|node| node.path == name) {
                    node.sha = child.sha.clone();
                    node.url = child.url.clone();
                    node.kind = NodeKind::Tree {
                        child: Some(Box::new(child)),
                    };
                }
            }
            for (name, sha) in blobs {
                if let Some(node) = staged.entries.iter_mut().find(|node| node.path == name) {
                    node.sha = Some(sha);
                    if let NodeKind::Blob { content, .. } = &mut node.kind {
                        *content = None;
                    }
                }
            }

            let payload = TreePayload::from_tree(&staged)?;
            let response = self.store.write_tree(&payload).await?;
            response.ensure_complete()?;
            if response.sha.is_none() {
                return Err(PatchError::RemoteFetch(format!(
                    "remote did not assign a hash to tree '{}'",
                    current_path
                )));
            }
            debug!(
                "wrote tree '{}' as {}",
                current_path,
                response.sha.as_deref().unwrap_or_default()
            );

            Ok(reattach(response, staged, tree.base_tree.clone()))
        }
        .boxed()
    }
}

/// Hang the staged subtrees off the remote's listing where the hashes agree
fn reattach(response: Tree, staged: Tree, base_tree: Option<String>) -> Tree {
    let mut children: HashMap<String, Box<Tree>> = staged
        .entries
        .into_iter()
        .filter_map(|node| match node.kind {
            NodeKind::Tree { child: Some(child) } => Some((node.path, child)),
            _ => None,
        })
        .collect();

    let entries = response
        .entries
        .into_iter()
        .map(|mut node| {
            if let NodeKind::Tree { child } = &mut node.kind {
                if let Some(sub) = children.remove(&node.path) {
                    if sub.sha == node.sha {
                        *child = Some(sub);
                    }
                }
            }
            node
        })
        .collect();

    Tree {
        base_tree,
        entries,
        truncated: false,
        removed: Vec::new(),
        ..response
    }
}
