//! File-level diff records and their classification

use crate::error::PatchError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Line or byte statistics for one changed file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStats {
    Text { insertions: u64, deletions: u64 },
    Binary { before: u64, after: u64 },
}

/// One changed path from a local diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawChange", into = "RawChange")]
pub struct FileChange {
    /// Repository-relative, forward-slash separated
    pub path: String,
    pub stats: ChangeStats,
}

impl FileChange {
    pub fn text(path: impl Into<String>, insertions: u64, deletions: u64) -> Self {
        Self {
            path: path.into(),
            stats: ChangeStats::Text {
                insertions,
                deletions,
            },
        }
    }

    pub fn binary(path: impl Into<String>, before: u64, after: u64) -> Self {
        Self {
            path: path.into(),
            stats: ChangeStats::Binary { before, after },
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self.stats, ChangeStats::Binary { .. })
    }
}

/// Kind of change a [`FileChange`] represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKind::Added => write!(f, "added"),
            ChangeKind::Modified => write!(f, "modified"),
            ChangeKind::Deleted => write!(f, "deleted"),
        }
    }
}

/// Decides whether a change adds, modifies or deletes its file.
///
/// Text changes whose insertion count alone is ambiguous consult the working
/// copy: a file that is still on disk was modified, one that is gone was
/// deleted.
#[derive(Debug, Clone, Copy)]
pub struct ChangeClassifier<'a> {
    working_dir: &'a Path,
}

impl<'a> ChangeClassifier<'a> {
    pub fn new(working_dir: &'a Path) -> Self {
        Self { working_dir }
    }

    fn exists_on_disk(&self, change: &FileChange) -> bool {
        self.working_dir.join(&change.path).exists()
    }

    pub fn is_added(&self, change: &FileChange) -> bool {
        match change.stats {
            ChangeStats::Binary { before, after } => before == 0 && after > 0,
            ChangeStats::Text {
                insertions,
                deletions,
            } => insertions > 0 && deletions == 0,
        }
    }

    pub fn is_modified(&self, change: &FileChange) -> bool {
        match change.stats {
            ChangeStats::Binary { before, after } => before > 0 && after > 0,
            ChangeStats::Text {
                insertions,
                deletions,
            } => {
                (insertions > 0 && deletions > 0)
                    || (insertions == 0 && self.exists_on_disk(change))
            }
        }
    }

    pub fn is_deleted(&self, change: &FileChange) -> bool {
        match change.stats {
            ChangeStats::Binary { before, after } => before > 0 && after == 0,
            ChangeStats::Text {
                insertions,
                deletions,
            } => insertions == 0 && deletions > 0 && !self.exists_on_disk(change),
        }
    }

    /// Combine the three predicates.
    ///
    /// A change matching none of them (e.g. a text change with no inserted or
    /// deleted lines whose file is gone) is reported as
    /// [`PatchError::UnclassifiedChange`] rather than guessed at.
    pub fn classify(&self, change: &FileChange) -> Result<ChangeKind, PatchError> {
        let matches: Vec<ChangeKind> = [
            (ChangeKind::Added, self.is_added(change)),
            (ChangeKind::Modified, self.is_modified(change)),
            (ChangeKind::Deleted, self.is_deleted(change)),
        ]
        .into_iter()
        .filter_map(|(kind, hit)| hit.then_some(kind))
        .collect();

        match matches.as_slice() {
            [kind] => Ok(*kind),
            [] => Err(PatchError::UnclassifiedChange {
                path: change.path.clone(),
            }),
            _ => Err(PatchError::Validation(format!(
                "change to '{}' is ambiguous: matches {:?}",
                change.path, matches
            ))),
        }
    }
}

/// Wire form, compatible with `{file, insertions, deletions, binary}` and
/// `{file, before, after, binary}` records
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawChange {
    file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    insertions: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    deletions: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    before: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    after: Option<u64>,
    binary: bool,
}

impl TryFrom<RawChange> for FileChange {
    type Error = PatchError;

    fn try_from(raw: RawChange) -> Result<Self, Self::Error> {
        let stats = match (raw.binary, raw.insertions, raw.deletions, raw.before, raw.after) {
            (false, Some(insertions), Some(deletions), None, None) => ChangeStats::Text {
                insertions,
                deletions,
            },
            (true, None, None, Some(before), Some(after)) => ChangeStats::Binary { before, after },
            _ => {
                return Err(PatchError::Validation(format!(
                    "malformed change record for '{}': text records need insertions/deletions, \
                     binary records need before/after",
                    raw.file
                )))
            }
        };
        Ok(Self {
            path: raw.file,
            stats,
        })
    }
}

impl From<FileChange> for RawChange {
    fn from(change: FileChange) -> Self {
        match change.stats {
            ChangeStats::Text {
                insertions,
                deletions,
            } => Self {
                file: change.path,
                insertions: Some(insertions),
                deletions: Some(deletions),
                before: None,
                after: None,
                binary: false,
            },
            ChangeStats::Binary { before, after } => Self {
                file: change.path,
                insertions: None,
                deletions: None,
                before: Some(before),
                after: Some(after),
                binary: true,
            },
        }
    }
}
