//! Request bodies for the tree-write endpoint

use crate::error::PatchError;
use crate::tree::{Encoding, FileMode, NodeKind, ObjectType, Tree, TreeNode};
use serde::Serialize;

/// Body of a tree-write request: one directory level, children by hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_tree: Option<String>,
    pub tree: Vec<PayloadEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayloadEntry {
    pub path: String,
    pub mode: FileMode,
    #[serde(rename = "type")]
    pub object_type: ObjectType,
    /// Omitted for new content; `Some(None)` serializes as `null` and deletes
    /// the entry from `base_tree`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Body of a blob-write request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlobPayload {
    pub content: String,
    pub encoding: Encoding,
}

impl BlobPayload {
    /// Request for a node's inline content, if it has any
    pub fn from_node(node: &TreeNode) -> Option<Self> {
        match &node.kind {
            NodeKind::Blob {
                content: Some(content),
                encoding,
                ..
            } => Some(Self {
                content: content.clone(),
                encoding: *encoding,
            }),
            _ => None,
        }
    }
}

impl TreePayload {
    /// Build the request for a single tree level.
    ///
    /// Every subtree and every base64 blob must already carry the hash the
    /// remote assigned to it; only UTF-8 content can be inlined.
    pub fn from_tree(tree: &Tree) -> Result<Self, PatchError> {
        let mut entries = Vec::with_capacity(tree.entries.len() + tree.removed.len());

        for node in &tree.entries {
            let (sha, content) = match (&node.kind, &node.sha) {
                (_, Some(sha)) => (Some(Some(sha.clone())), None),
                (
                    NodeKind::Blob {
                        content: Some(_),
                        encoding: Encoding::Base64,
                        ..
                    },
                    None,
                ) => {
                    return Err(PatchError::Validation(format!(
                        "binary blob '{}' has not been written yet",
                        node.path
                    )))
                }
                (NodeKind::Blob { content: Some(content), .. }, None) => (None, Some(content.clone())),
                (NodeKind::Tree { .. }, None) => {
                    return Err(PatchError::Validation(format!(
                        "subtree '{}' has not been written yet",
                        node.path
                    )))
                }
                _ => {
                    return Err(PatchError::Validation(format!(
                        "entry '{}' has neither a hash nor content",
                        node.path
                    )))
                }
            };
            entries.push(PayloadEntry {
                path: node.path.clone(),
                mode: node.mode(),
                object_type: node.object_type(),
                sha,
                content,
            });
        }

        if !tree.removed.is_empty() && tree.base_tree.is_none() {
            return Err(PatchError::Validation(
                "a tree without base_tree cannot delete entries".to_string(),
            ));
        }
        entries.extend(tree.removed.iter().map(|node| PayloadEntry {
            path: node.path.clone(),
            mode: node.mode(),
            object_type: node.object_type(),
            sha: Some(None),
            content: None,
        }));

        Ok(Self {
            base_tree: tree.base_tree.clone(),
            tree: entries,
        })
    }
}
