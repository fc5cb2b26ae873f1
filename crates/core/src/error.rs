//! Error taxonomy shared by every treepatch crate

use std::path::PathBuf;

/// Errors raised while fetching, merging or submitting a tree patch.
///
/// Every variant fails the whole operation; nothing in the core retries.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    /// A change record or path violates the structural rules of the merge
    /// (path outside the target scope, malformed record, unexpanded subtree).
    #[error("validation error: {0}")]
    Validation(String),

    /// A read or write against the remote tree API failed.
    #[error("remote fetch error: {0}")]
    RemoteFetch(String),

    /// The remote returned something this crate does not handle, such as a
    /// truncated tree listing.
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),

    /// A change matched none of the added/modified/deleted rules.
    #[error("change to '{path}' is neither an addition, a modification nor a deletion")]
    UnclassifiedChange { path: String },

    /// A bounded poll ran out of attempts.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Reading a file from the working copy failed.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PatchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error came from the remote side.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteFetch(_))
    }
}
