//! Detection of source files converted from JavaScript to TypeScript.
//!
//! A conversion is the same logical file leaving the untyped extension (`js`)
//! and reappearing with a typed one (`ts`/`tsx`). Commits describe this either
//! as a single rename record or as an independent removal plus addition; both
//! shapes are matched here. Nothing in this module performs I/O or fails.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

const TYPED_EXTENSIONS: [&str; 2] = ["ts", "tsx"];
const UNTYPED_EXTENSIONS: [&str; 1] = ["js"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Removed,
    Renamed,
    Modified,
}

/// One changed file in a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChangeRecord {
    pub path: String,
    pub kind: ChangeKind,
    /// Set only for renames.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_path: Option<String>,
}

impl FileChangeRecord {
    pub fn added(path: impl Into<String>) -> Self {
        Self::plain(path, ChangeKind::Added)
    }

    pub fn removed(path: impl Into<String>) -> Self {
        Self::plain(path, ChangeKind::Removed)
    }

    pub fn modified(path: impl Into<String>) -> Self {
        Self::plain(path, ChangeKind::Modified)
    }

    pub fn renamed(previous_path: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: ChangeKind::Renamed,
            previous_path: Some(previous_path.into()),
        }
    }

    fn plain(path: impl Into<String>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
            previous_path: None,
        }
    }
}

/// A path split into directory, basename and extension.
///
/// The extension is whatever follows the last `.` of the final segment. A
/// segment with no `.`, a dotfile such as `.eslintrc`, and a name ending in `.`
/// all have no extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathParts<'a> {
    pub directory: &'a str,
    pub basename: &'a str,
    pub extension: Option<&'a str>,
}

impl<'a> PathParts<'a> {
    pub fn parse(path: &'a str) -> Self {
        let (directory, file_name) = match path.rfind('/') {
            Some(idx) => (&path[..idx], &path[idx + 1..]),
            None => ("", path),
        };

        match file_name.rfind('.') {
            Some(idx) if idx > 0 && idx + 1 < file_name.len() => Self {
                directory,
                basename: &file_name[..idx],
                extension: Some(&file_name[idx + 1..]),
            },
            _ => Self {
                directory,
                basename: file_name,
                extension: None,
            },
        }
    }

    pub fn class(&self) -> ExtensionClass {
        ExtensionClass::of(self.extension)
    }

    /// Directory plus basename: identifies a logical file across extensions.
    fn logical_key(&self) -> (&'a str, &'a str) {
        (self.directory, self.basename)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionClass {
    Typed,
    Untyped,
    Other,
}

impl ExtensionClass {
    pub fn of(extension: Option<&str>) -> Self {
        match extension {
            Some(ext) if TYPED_EXTENSIONS.contains(&ext) => ExtensionClass::Typed,
            Some(ext) if UNTYPED_EXTENSIONS.contains(&ext) => ExtensionClass::Untyped,
            _ => ExtensionClass::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    Rename,
    AddRemove,
}

/// A single detected conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conversion {
    pub from: String,
    pub to: String,
    pub source: MatchSource,
}

/// Count files converted from an untyped to a typed extension.
pub fn count_conversions(changes: &[FileChangeRecord]) -> usize {
    find_conversions(changes).len()
}

/// Convenience over plain added/removed path lists, as push events report them.
pub fn count_added_removed<S: AsRef<str>>(added: &[S], removed: &[S]) -> usize {
    let changes: Vec<FileChangeRecord> = removed
        .iter()
        .map(|p| FileChangeRecord::removed(p.as_ref()))
        .chain(added.iter().map(|p| FileChangeRecord::added(p.as_ref())))
        .collect();
    count_conversions(&changes)
}

/// Find every conversion in a commit's changes.
///
/// Rename records match on basename alone since the record links the two
/// paths. Loose removals and additions match on directory plus basename, one
/// to one, consuming candidates in input order.
pub fn find_conversions(changes: &[FileChangeRecord]) -> Vec<Conversion> {
    let mut conversions = Vec::new();
    let mut removals = Vec::new();
    let mut additions: HashMap<(&str, &str), VecDeque<&str>> = HashMap::new();

    for change in changes {
        match change.kind {
            ChangeKind::Renamed => {
                if let Some(conversion) = match_rename(change) {
                    conversions.push(conversion);
                }
            }
            ChangeKind::Removed => {
                let parts = PathParts::parse(&change.path);
                if parts.class() == ExtensionClass::Untyped {
                    removals.push((parts.logical_key(), change.path.as_str()));
                }
            }
            ChangeKind::Added => {
                let parts = PathParts::parse(&change.path);
                if parts.class() == ExtensionClass::Typed {
                    additions
                        .entry(parts.logical_key())
                        .or_default()
                        .push_back(change.path.as_str());
                }
            }
            ChangeKind::Modified => {}
        }
    }

    for (key, removed_path) in removals {
        let Some(added_path) = additions.get_mut(&key).and_then(|queue| queue.pop_front()) else {
            continue;
        };
        conversions.push(Conversion {
            from: removed_path.to_string(),
            to: added_path.to_string(),
            source: MatchSource::AddRemove,
        });
    }

    conversions
}

fn match_rename(change: &FileChangeRecord) -> Option<Conversion> {
    let previous_path = change.previous_path.as_deref()?;
    let previous = PathParts::parse(previous_path);
    let current = PathParts::parse(&change.path);

    let converted = previous.class() == ExtensionClass::Untyped
        && current.class() == ExtensionClass::Typed
        && previous.basename == current.basename;

    converted.then(|| Conversion {
        from: previous_path.to_string(),
        to: change.path.clone(),
        source: MatchSource::Rename,
    })
}
