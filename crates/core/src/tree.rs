//! Tree representation mirroring the remote object model
//!
//! A [`Tree`] is one directory listing as the remote API returns it, with
//! optionally materialized subtrees hanging off its directory entries.
//! The JSON shape matches the remote API (`childTree` is the only addition)
//! so that fetched and merged graphs are interchangeable.

use crate::error::PatchError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Mode code of a tree entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileMode {
    /// Regular file
    #[serde(rename = "100644")]
    File,
    /// Executable file
    #[serde(rename = "100755")]
    Executable,
    /// Subdirectory
    #[serde(rename = "040000")]
    Tree,
    /// Submodule commit reference
    #[serde(rename = "160000")]
    Submodule,
    /// Symbolic link
    #[serde(rename = "120000")]
    Symlink,
}

impl FileMode {
    /// The mode as the remote spells it
    pub fn as_str(&self) -> &'static str {
        match self {
            FileMode::File => "100644",
            FileMode::Executable => "100755",
            FileMode::Tree => "040000",
            FileMode::Submodule => "160000",
            FileMode::Symlink => "120000",
        }
    }

    /// Object type implied by this mode
    pub fn object_type(&self) -> ObjectType {
        match self {
            FileMode::File | FileMode::Executable | FileMode::Symlink => ObjectType::Blob,
            FileMode::Tree => ObjectType::Tree,
            FileMode::Submodule => ObjectType::Commit,
        }
    }
}

/// Object type of a tree entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    Blob,
    Tree,
    Commit,
}

/// How inline blob content is spelled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Encoding {
    #[default]
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "base64")]
    Base64,
}

impl Encoding {
    pub fn is_utf8(&self) -> bool {
        matches!(self, Encoding::Utf8)
    }
}

/// What a tree entry points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// File content. `content` is only set for new or changed blobs.
    ///
    /// Base64 content cannot be inlined in a tree write; it has to be stored
    /// as a blob object first.
    Blob {
        mode: FileMode,
        size: u64,
        content: Option<String>,
        encoding: Encoding,
    },
    /// Subdirectory, with its listing when it has been materialized
    Tree { child: Option<Box<Tree>> },
    /// Submodule commit reference
    Submodule,
}

/// One entry in a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEntry", into = "RawEntry")]
pub struct TreeNode {
    /// Single path segment within the parent tree
    pub path: String,
    /// Remote hash; `None` asks the remote to assign one
    pub sha: Option<String>,
    /// Remote locator, informational only
    pub url: Option<String>,
    pub kind: NodeKind,
}

impl TreeNode {
    /// A new or changed blob that the remote still has to hash
    pub fn new_blob(path: impl Into<String>, mode: FileMode, content: String) -> Self {
        Self {
            path: path.into(),
            sha: None,
            url: None,
            kind: NodeKind::Blob {
                mode,
                size: content.len() as u64,
                content: Some(content),
                encoding: Encoding::Utf8,
            },
        }
    }

    /// A new or changed binary blob, carried as base64
    pub fn new_binary_blob(path: impl Into<String>, mode: FileMode, bytes: &[u8]) -> Self {
        Self {
            path: path.into(),
            sha: None,
            url: None,
            kind: NodeKind::Blob {
                mode,
                size: bytes.len() as u64,
                content: Some(STANDARD.encode(bytes)),
                encoding: Encoding::Base64,
            },
        }
    }

    /// Encoding of the inline content; trees and submodules report UTF-8
    pub fn encoding(&self) -> Encoding {
        match &self.kind {
            NodeKind::Blob { encoding, .. } => *encoding,
            _ => Encoding::Utf8,
        }
    }

    /// A directory entry wrapping a materialized subtree
    pub fn with_subtree(path: impl Into<String>, sha: Option<String>, url: Option<String>, child: Tree) -> Self {
        Self {
            path: path.into(),
            sha,
            url,
            kind: NodeKind::Tree {
                child: Some(Box::new(child)),
            },
        }
    }

    pub fn mode(&self) -> FileMode {
        match &self.kind {
            NodeKind::Blob { mode, .. } => *mode,
            NodeKind::Tree { .. } => FileMode::Tree,
            NodeKind::Submodule => FileMode::Submodule,
        }
    }

    pub fn object_type(&self) -> ObjectType {
        self.mode().object_type()
    }

    pub fn is_tree(&self) -> bool {
        matches!(self.kind, NodeKind::Tree { .. })
    }

    /// Materialized subtree of a directory entry
    pub fn child(&self) -> Option<&Tree> {
        match &self.kind {
            NodeKind::Tree { child } => child.as_deref(),
            _ => None,
        }
    }

    /// Inline content of a new or changed blob
    pub fn content(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Blob { content, .. } => content.as_deref(),
            _ => None,
        }
    }
}

/// An ordered directory listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    /// Hash of the tree this one incrementally updates
    #[serde(default)]
    pub base_tree: Option<String>,
    /// Remote hash; `None` for a tree not yet written
    pub sha: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Entries in listing order
    #[serde(rename = "tree")]
    pub entries: Vec<TreeNode>,
    /// The remote cut the listing short
    #[serde(default)]
    pub truncated: bool,
    /// Entries of `base_tree` this tree drops; written as deletions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<TreeNode>,
}

impl Tree {
    /// Look up a direct child by path segment
    pub fn get(&self, segment: &str) -> Option<&TreeNode> {
        self.entries.iter().find(|node| node.path == segment)
    }

    /// Walk a slash-separated path down through materialized subtrees
    pub fn find(&self, path: &str) -> Option<&TreeNode> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let mut node = self.get(segments.next()?)?;
        for segment in segments {
            node = node.child()?.get(segment)?;
        }
        Some(node)
    }

    /// Fail on a listing the remote truncated
    pub fn ensure_complete(&self) -> Result<(), PatchError> {
        if self.truncated {
            return Err(PatchError::UnsupportedInput(format!(
                "tree {} was truncated by the remote; paginated listings are not supported",
                self.sha.as_deref().unwrap_or("<new>")
            )));
        }
        Ok(())
    }
}

/// Flat wire form of a [`TreeNode`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    path: String,
    mode: FileMode,
    #[serde(rename = "type")]
    object_type: ObjectType,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    sha: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Encoding::is_utf8")]
    encoding: Encoding,
    #[serde(default)]
    child_tree: Option<Box<Tree>>,
}

impl TryFrom<RawEntry> for TreeNode {
    type Error = PatchError;

    fn try_from(raw: RawEntry) -> Result<Self, Self::Error> {
        if raw.path.is_empty() || raw.path.contains('/') {
            return Err(PatchError::UnsupportedInput(format!(
                "tree entry path '{}' is not a single segment",
                raw.path
            )));
        }
        if raw.mode.object_type() != raw.object_type {
            return Err(PatchError::UnsupportedInput(format!(
                "entry '{}' has mode {} but type {:?}",
                raw.path,
                raw.mode.as_str(),
                raw.object_type
            )));
        }

        let kind = match raw.object_type {
            ObjectType::Blob => NodeKind::Blob {
                mode: raw.mode,
                size: raw.size.unwrap_or(0),
                content: raw.content,
                encoding: raw.encoding,
            },
            ObjectType::Tree => NodeKind::Tree {
                child: raw.child_tree,
            },
            ObjectType::Commit => NodeKind::Submodule,
        };

        Ok(Self {
            path: raw.path,
            sha: raw.sha,
            url: raw.url,
            kind,
        })
    }
}

impl From<TreeNode> for RawEntry {
    fn from(node: TreeNode) -> Self {
        let mode = node.mode();
        let (size, content, encoding, child_tree) = match node.kind {
            NodeKind::Blob {
                size,
                content,
                encoding,
                ..
            } => (Some(size), content, encoding, None),
            NodeKind::Tree { child } => (None, None, Encoding::Utf8, child),
            NodeKind::Submodule => (None, None, Encoding::Utf8, None),
        };
        Self {
            path: node.path,
            mode,
            object_type: mode.object_type(),
            size,
            sha: node.sha,
            url: node.url,
            content,
            encoding,
            child_tree,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYBOARDS: &str = include_str!("../testdata/keyboards_tree.json");

    #[test]
    fn test_parse_materialized_fixture() {
        let tree: Tree = serde_json::from_str(KEYBOARDS).unwrap();

        assert_eq!(tree.sha.as_deref(), Some("9fb037999f264ba9a7fc6274d15fa3ae2ab98312"));
        assert_eq!(tree.entries.len(), 3);
        assert_eq!(tree.entries[0].mode(), FileMode::Executable);
        assert_eq!(tree.entries[1].mode(), FileMode::File);
        assert!(tree.entries[2].is_tree());

        let kps = tree.find("release/s/shan/source/shan.kps").unwrap();
        assert_eq!(kps.sha.as_deref(), Some("bb1f0dda56794a5fa2abaaa26f459d0a"));

        // Off the desired path nothing is expanded
        let t = tree.find("release/t").unwrap();
        assert!(t.is_tree());
        assert!(t.child().is_none());
    }

    #[test]
    fn test_mode_type_mismatch_rejected() {
        let json = r#"{"path":"README.md","mode":"040000","type":"blob","sha":"abc"}"#;
        let err = serde_json::from_str::<TreeNode>(json).unwrap_err();
        assert!(err.to_string().contains("mode 040000"));
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let json = r#"{"path":"x","mode":"100600","type":"blob","sha":"abc"}"#;
        assert!(serde_json::from_str::<TreeNode>(json).is_err());
    }

    #[test]
    fn test_submodule_entry() {
        let json = r#"{"path":"vendor","mode":"160000","type":"commit","sha":"c0ffee"}"#;
        let node: TreeNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.kind, NodeKind::Submodule);
        assert_eq!(node.object_type(), ObjectType::Commit);
    }

    #[test]
    fn test_new_blob_serializes_content_without_sha() {
        let node = TreeNode::new_blob("run.sh", FileMode::Executable, "echo hi".to_string());
        let value = serde_json::to_value(&node).unwrap();

        assert_eq!(value["mode"], "100755");
        assert_eq!(value["type"], "blob");
        assert_eq!(value["size"], 7);
        assert!(value["sha"].is_null());
        assert_eq!(value["content"], "echo hi");
    }

    #[test]
    fn test_binary_blob_keeps_encoding_through_json() {
        let node = TreeNode::new_binary_blob("font.ttf", FileMode::File, &[0, 159, 146, 150]);
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["size"], 4);
        assert_eq!(value["content"], "AJ+Slg==");
        assert_eq!(value["encoding"], "base64");

        let back: TreeNode = serde_json::from_value(value).unwrap();
        assert_eq!(back, node);

        let text = serde_json::to_value(TreeNode::new_blob("a.txt", FileMode::File, "a".to_string())).unwrap();
        assert!(text.get("encoding").is_none());
    }

    #[test]
    fn test_ensure_complete_rejects_truncated() {
        let tree = Tree {
            sha: Some("abc".to_string()),
            truncated: true,
            ..Default::default()
        };
        assert!(matches!(tree.ensure_complete(), Err(PatchError::UnsupportedInput(_))));
    }
}
