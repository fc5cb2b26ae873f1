//! Treepatch Core - Merging local changes into remote content-addressed trees
//!
//! This crate provides the local side of a tree patch:
//! - Tree/blob data model matching the remote tree API
//! - Change classification (added / modified / deleted)
//! - Blob reading from the working copy
//! - Merging changes into a previously fetched tree
//! - Tree-write request bodies

pub mod blob;
mod builder;
pub mod change;
pub mod error;
pub mod merge;
pub mod path;
pub mod payload;
pub mod tree;

// Re-export main types for convenience
pub use blob::LocalBlobReader;
pub use change::{ChangeClassifier, ChangeKind, ChangeStats, FileChange};
pub use error::PatchError;
pub use merge::TreeMerger;
pub use payload::{BlobPayload, PayloadEntry, TreePayload};
pub use tree::{Encoding, FileMode, NodeKind, ObjectType, Tree, TreeNode};

/// Common result type used throughout treepatch
pub type Result<T> = std::result::Result<T, PatchError>;
