//! Reading changed files out of the working copy

use crate::error::PatchError;
use crate::tree::{FileMode, TreeNode};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads one changed file into a blob leaf that the remote still has to hash
#[derive(Debug, Clone)]
pub struct LocalBlobReader {
    working_dir: PathBuf,
}

impl LocalBlobReader {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Read `repo_path` (repository-relative) into a leaf named after its
    /// last segment.
    ///
    /// Text files are inlined as UTF-8, binary files as base64 marked with
    /// [`Encoding::Base64`](crate::tree::Encoding). Symbolic
    /// links become mode `120000` entries whose content is the link target.
    pub async fn read(&self, repo_path: &str, binary: bool) -> Result<TreeNode, PatchError> {
        let file_name = repo_path.rsplit('/').next().unwrap_or(repo_path);
        let full_path = self.working_dir.join(repo_path);

        let metadata = tokio::fs::symlink_metadata(&full_path)
            .await
            .map_err(|e| PatchError::io(&full_path, e))?;

        if metadata.file_type().is_symlink() {
            let target = tokio::fs::read_link(&full_path)
                .await
                .map_err(|e| PatchError::io(&full_path, e))?;
            let target = target.to_str().ok_or_else(|| {
                PatchError::Validation(format!("symlink target of '{}' is not valid UTF-8", repo_path))
            })?;
            debug!("read symlink {} -> {}", repo_path, target);
            return Ok(TreeNode::new_blob(file_name, FileMode::Symlink, target.to_string()));
        }

        let bytes = tokio::fs::read(&full_path)
            .await
            .map_err(|e| PatchError::io(&full_path, e))?;

        let mode = if is_executable(&metadata) {
            FileMode::Executable
        } else {
            FileMode::File
        };
        debug!("read blob {} ({} bytes, mode {})", repo_path, bytes.len(), mode.as_str());

        if binary {
            return Ok(TreeNode::new_binary_blob(file_name, mode, &bytes));
        }
        let content = String::from_utf8(bytes).map_err(|_| {
            PatchError::Validation(format!(
                "'{}' is listed as a text change but is not valid UTF-8",
                repo_path
            ))
        })?;
        Ok(TreeNode::new_blob(file_name, mode, content))
    }
}

#[cfg(unix)]
fn is_executable(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    // owner-execute (S_IXUSR)
    metadata.permissions().mode() & 0o100 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &std::fs::Metadata) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Encoding, NodeKind};
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_read_text_blob() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("release/s/shan")).unwrap();
        fs::write(dir.path().join("release/s/shan/README"), "Readme for Shan keyboard").unwrap();

        let reader = LocalBlobReader::new(dir.path());
        let node = reader.read("release/s/shan/README", false).await.unwrap();

        assert_eq!(node.path, "README");
        assert_eq!(node.sha, None);
        assert_eq!(
            node.kind,
            NodeKind::Blob {
                mode: FileMode::File,
                size: 24,
                content: Some("Readme for Shan keyboard".to_string()),
                encoding: Encoding::Utf8,
            }
        );
    }

    #[tokio::test]
    async fn test_read_binary_blob_as_base64() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("lib.so"), [0u8, 159, 146, 150]).unwrap();

        let reader = LocalBlobReader::new(dir.path());
        let node = reader.read("lib.so", true).await.unwrap();

        assert_eq!(node.content(), Some("AJ+Slg=="));
        assert_eq!(node.encoding(), Encoding::Base64);
        assert_eq!(node.mode(), FileMode::File);
        assert!(matches!(node.kind, NodeKind::Blob { size: 4, .. }));
    }

    #[tokio::test]
    async fn test_invalid_utf8_text_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("odd.txt"), [0xffu8, 0xfe]).unwrap();

        let reader = LocalBlobReader::new(dir.path());
        let err = reader.read("odd.txt", false).await.unwrap_err();
        assert!(matches!(err, PatchError::Validation(_)));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let reader = LocalBlobReader::new(dir.path());
        let err = reader.read("nope.txt", false).await.unwrap_err();
        assert!(matches!(err, PatchError::Io { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_executable_bit_selects_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let script = dir.path().join("build.sh");
        fs::write(&script, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let reader = LocalBlobReader::new(dir.path());
        let node = reader.read("build.sh", false).await.unwrap();
        assert_eq!(node.mode(), FileMode::Executable);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_becomes_link_entry() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("target.txt"), "x").unwrap();
        std::os::unix::fs::symlink("target.txt", dir.path().join("link")).unwrap();

        let reader = LocalBlobReader::new(dir.path());
        let node = reader.read("link", false).await.unwrap();
        assert_eq!(node.mode(), FileMode::Symlink);
        assert_eq!(node.content(), Some("target.txt"));
    }
}
