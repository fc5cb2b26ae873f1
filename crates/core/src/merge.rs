//! Merging local changes into a previously fetched tree
//!
//! The merge walks the previous tree and the local change dictionary side by
//! side. Nodes on a changed path are rebuilt with their hash cleared so the
//! remote assigns a new one; every other node is copied through untouched, so
//! the resulting graph differs from the previous one only along the changed
//! branches.

use crate::blob::LocalBlobReader;
use crate::builder::{PathDictionary, PathEntry, TreeBuilder};
use crate::change::{ChangeClassifier, FileChange};
use crate::error::PatchError;
use crate::path;
use crate::tree::{NodeKind, Tree, TreeNode};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Produces the tree graph to submit for a set of local changes
#[derive(Debug, Clone)]
pub struct TreeMerger {
    working_dir: PathBuf,
}

impl TreeMerger {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Merge `changes` into `previous`, restricted to `scope`.
    ///
    /// `previous` must be materialized at least along `scope` (see the
    /// remote crate's fetcher). Every change must lie under `scope`; a single
    /// stray path fails the merge before anything is read from disk.
    ///
    /// The returned root has no `sha` yet and carries `base_tree` = the
    /// previous root's sha.
    pub async fn merge(&self, changes: &[FileChange], previous: &Tree, scope: &str) -> Result<Tree, PatchError> {
        let scope = path::normalize_scope(scope);

        for change in changes {
            path::validate(&change.path)?;
            if !path::is_within(&change.path, scope) {
                return Err(PatchError::Validation(format!(
                    "commit has changes outside of {}: {}",
                    scope, change.path
                )));
            }
        }
        previous.ensure_complete()?;

        let classifier = ChangeClassifier::new(&self.working_dir);
        let classified = changes
            .iter()
            .map(|change| classifier.classify(change).map(|kind| (change, kind)))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "Merging {} change(s) under '{}' into tree {}",
            classified.len(),
            scope,
            previous.sha.as_deref().unwrap_or("<new>")
        );

        let builder = TreeBuilder::new(LocalBlobReader::new(&self.working_dir));
        let dictionary = builder.build(&classified, scope).await?;

        stitch(previous, &dictionary, "")
    }
}

/// Rebuild `previous` with `changes` applied.
///
/// The rebuilt tree's `base_tree` is the sha of `previous`; pass an empty
/// default tree to build a directory from scratch.
fn stitch(previous: &Tree, changes: &PathDictionary, current_path: &str) -> Result<Tree, PatchError> {
    previous.ensure_complete()?;

    let mut entries = Vec::with_capacity(previous.entries.len() + changes.len());
    let mut removed = Vec::new();

    for node in &previous.entries {
        let node_path = path::join(current_path, &node.path);
        match changes.get(&node.path) {
            None => entries.push(node.clone()),
            Some(PathEntry::Leaf(leaf)) => {
                if node.is_tree() {
                    return Err(PatchError::Validation(format!(
                        "{} is a directory in the previous tree and cannot be replaced by a file",
                        node_path
                    )));
                }
                debug!("rewriting {}", node_path);
                entries.push(leaf.clone());
            }
            Some(PathEntry::Removed) => {
                if node.is_tree() {
                    return Err(PatchError::Validation(format!(
                        "{} is a directory; delete the files inside it instead",
                        node_path
                    )));
                }
                debug!("removing {}", node_path);
                removed.push(node.clone());
            }
            Some(PathEntry::Directory(sub)) => {
                let child = match &node.kind {
                    NodeKind::Tree { child: Some(child) } => child,
                    NodeKind::Tree { child: None } => {
                        return Err(PatchError::Validation(format!(
                            "{} was not materialized; fetch the previous tree along the changed path",
                            node_path
                        )))
                    }
                    _ => {
                        return Err(PatchError::Validation(format!(
                            "{} is a file in the previous tree but changes use it as a directory",
                            node_path
                        )))
                    }
                };
                let merged = stitch(child, sub, &node_path)?;
                if merged.entries.is_empty() {
                    debug!("dropping emptied directory {}", node_path);
                    removed.push(node.clone());
                } else {
                    entries.push(TreeNode::with_subtree(node.path.clone(), None, None, merged));
                }
            }
        }
    }

    for (segment, entry) in changes {
        if previous.get(segment).is_some() {
            continue;
        }
        let entry_path = path::join(current_path, segment);
        match entry {
            PathEntry::Leaf(leaf) => {
                debug!("adding {}", entry_path);
                entries.push(leaf.clone());
            }
            PathEntry::Removed => {
                return Err(PatchError::Validation(format!(
                    "cannot delete {}: it is not in the previous tree",
                    entry_path
                )))
            }
            PathEntry::Directory(sub) => {
                let fresh = stitch(&Tree::default(), sub, &entry_path)?;
                if !fresh.entries.is_empty() {
                    debug!("adding directory {}", entry_path);
                    entries.push(TreeNode::with_subtree(segment.clone(), None, None, fresh));
                }
            }
        }
    }

    Ok(Tree {
        base_tree: previous.sha.clone(),
        sha: None,
        url: None,
        entries,
        truncated: false,
        removed,
    })
}
