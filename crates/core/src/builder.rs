//! Folding local changes into a nested path dictionary
//!
//! The dictionary is scratch state for the merge: it mirrors the directory
//! structure of the changed paths only, and is discarded once the merger has
//! stitched it into the previous tree.

use crate::blob::LocalBlobReader;
use crate::change::{ChangeKind, FileChange};
use crate::error::PatchError;
use crate::path;
use crate::tree::TreeNode;
use std::collections::BTreeMap;
use tracing::debug;

/// Segment -> entry, in segment order
pub(crate) type PathDictionary = BTreeMap<String, PathEntry>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PathEntry {
    /// New or rewritten file
    Leaf(TreeNode),
    /// File deleted locally
    Removed,
    Directory(PathDictionary),
}

pub(crate) struct TreeBuilder {
    reader: LocalBlobReader,
}

impl TreeBuilder {
    pub(crate) fn new(reader: LocalBlobReader) -> Self {
        Self { reader }
    }

    /// Fold every classified change under `scope` into one dictionary rooted
    /// at the repository root.
    pub(crate) async fn build(
        &self,
        changes: &[(&FileChange, ChangeKind)],
        scope: &str,
    ) -> Result<PathDictionary, PatchError> {
        let mut root = PathDictionary::new();

        for (change, kind) in changes {
            if !path::is_within(&change.path, scope) {
                return Err(PatchError::Validation(format!(
                    "file {} is outside of {}",
                    change.path, scope
                )));
            }

            let entry = match kind {
                ChangeKind::Deleted => PathEntry::Removed,
                ChangeKind::Added | ChangeKind::Modified => {
                    PathEntry::Leaf(self.reader.read(&change.path, change.is_binary()).await?)
                }
            };
            debug!("folding {} change to {}", kind, change.path);
            add_tree(&mut root, "", &change.path, &change.path, entry)?;
        }

        Ok(root)
    }
}

/// Insert `entry` at `path_to_process` below `current_path`.
///
/// `change_path` is the full repository path of the change and must start
/// with every directory consumed on the way down.
fn add_tree(
    parent: &mut PathDictionary,
    current_path: &str,
    path_to_process: &str,
    change_path: &str,
    entry: PathEntry,
) -> Result<(), PatchError> {
    if !change_path.starts_with(current_path) {
        return Err(PatchError::Validation(format!(
            "file {} doesn't start with {}",
            change_path, current_path
        )));
    }

    let (head, rest) = path::split_first(path_to_process);

    if rest.is_empty() {
        return match parent.get(head) {
            Some(PathEntry::Directory(_)) => Err(PatchError::Validation(format!(
                "{} is listed as a file but other changes use it as a directory",
                change_path
            ))),
            Some(_) => Err(PatchError::Validation(format!(
                "{} appears more than once in the change list",
                change_path
            ))),
            None => {
                parent.insert(head.to_string(), entry);
                Ok(())
            }
        };
    }

    let dir_path = path::join(current_path, head);
    let child = parent
        .entry(head.to_string())
        .or_insert_with(|| PathEntry::Directory(PathDictionary::new()));

    match child {
        PathEntry::Directory(sub) => add_tree(sub, &dir_path, rest, change_path, entry),
        _ => Err(PatchError::Validation(format!(
            "{} is used as a directory by {} but is itself a changed file",
            dir_path, change_path
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::FileMode;
    use std::fs;
    use tempfile::TempDir;

    fn dir(entries: Vec<(&str, PathEntry)>) -> PathEntry {
        PathEntry::Directory(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    #[tokio::test]
    async fn test_constructs_tree() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("release/s/shan")).unwrap();
        fs::write(tmp.path().join("release/s/shan/README"), "Readme for Shan keyboard").unwrap();

        let builder = TreeBuilder::new(LocalBlobReader::new(tmp.path()));
        let change = FileChange::text("release/s/shan/README", 2, 1);
        let result = builder.build(&[(&change, ChangeKind::Modified)], "").await.unwrap();

        let readme = TreeNode::new_blob("README", FileMode::File, "Readme for Shan keyboard".to_string());
        let expected = dir(vec![(
            "release",
            dir(vec![("s", dir(vec![("shan", dir(vec![("README", PathEntry::Leaf(readme))]))]))]),
        )]);
        assert_eq!(PathEntry::Directory(result), expected);
    }

    #[tokio::test]
    async fn test_sibling_changes_share_directories() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("a/b")).unwrap();
        fs::write(tmp.path().join("a/one.txt"), "1").unwrap();
        fs::write(tmp.path().join("a/b/two.txt"), "2").unwrap();

        let builder = TreeBuilder::new(LocalBlobReader::new(tmp.path()));
        let one = FileChange::text("a/one.txt", 1, 0);
        let two = FileChange::text("a/b/two.txt", 1, 0);
        let gone = FileChange::text("a/b/old.txt", 0, 4);
        let result = builder
            .build(
                &[
                    (&one, ChangeKind::Added),
                    (&two, ChangeKind::Added),
                    (&gone, ChangeKind::Deleted),
                ],
                "a",
            )
            .await
            .unwrap();

        let PathEntry::Directory(a) = &result["a"] else {
            panic!("a should be a directory");
        };
        assert!(matches!(a["one.txt"], PathEntry::Leaf(_)));
        let PathEntry::Directory(b) = &a["b"] else {
            panic!("b should be a directory");
        };
        assert!(matches!(b["two.txt"], PathEntry::Leaf(_)));
        assert_eq!(b["old.txt"], PathEntry::Removed);
    }

    #[tokio::test]
    async fn test_change_outside_scope_rejected() {
        let tmp = TempDir::new().unwrap();
        let builder = TreeBuilder::new(LocalBlobReader::new(tmp.path()));
        let change = FileChange::text("README.md", 1, 0);

        let err = builder
            .build(&[(&change, ChangeKind::Added)], "release/s/shan")
            .await
            .unwrap_err();
        assert!(matches!(err, PatchError::Validation(_)));
    }

    #[test]
    fn test_add_tree_rejects_unscoped_path() {
        let mut root = PathDictionary::new();
        let err = add_tree(&mut root, "release/s", "shan/README", "README", PathEntry::Removed).unwrap_err();
        assert!(err.to_string().contains("doesn't start with release/s"));
    }

    #[test]
    fn test_add_tree_rejects_file_directory_clash() {
        let mut root = PathDictionary::new();
        add_tree(&mut root, "", "a/b", "a/b", PathEntry::Removed).unwrap();

        assert!(add_tree(&mut root, "", "a/b/c", "a/b/c", PathEntry::Removed).is_err());
        assert!(add_tree(&mut root, "", "a", "a", PathEntry::Removed).is_err());
        assert!(add_tree(&mut root, "", "a/b", "a/b", PathEntry::Removed).is_err());
    }
}
