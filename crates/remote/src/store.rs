//! Tree read/write capability

use async_trait::async_trait;
use tp_core::{BlobPayload, PatchError, Tree, TreePayload};

/// Access to the remote's tree objects.
///
/// Listings come back one level at a time: directory entries never carry a
/// `childTree`.
#[async_trait]
pub trait TreeStore: Send + Sync {
    /// Read the listing of the tree with hash `sha`
    async fn read_tree(&self, sha: &str) -> Result<Tree, PatchError>;

    /// Write one tree level and return the stored listing with assigned hashes
    async fn write_tree(&self, payload: &TreePayload) -> Result<Tree, PatchError>;

    /// Store one blob object and return its hash
    async fn write_blob(&self, blob: &BlobPayload) -> Result<String, PatchError>;
}
