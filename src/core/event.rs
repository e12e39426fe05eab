//! Triggering event payloads.
//!
//! Each event kind keeps its branch, commit and file lists in a different
//! place. `EVENT_SHAPES` maps every supported kind to the JSON pointers that
//! locate those fields; nothing else in the crate inspects payload layout.

use std::path::Path;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use serde_json::Value;

use crate::conversion::FileChangeRecord;
use crate::error::{Error, Result};
use crate::utils::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Push,
    PullRequest,
    PullRequestTarget,
    PullRequestReview,
    PullRequestReviewComment,
}

struct FileListPointers {
    added: &'static str,
    removed: &'static str,
    modified: &'static str,
}

struct EventShape {
    kind: EventKind,
    name: &'static str,
    branch: &'static str,
    sha: &'static str,
    author_email: Option<&'static str>,
    timestamp: Option<&'static str>,
    files: Option<FileListPointers>,
}

const PUSH_FILES: FileListPointers = FileListPointers {
    added: "/head_commit/added",
    removed: "/head_commit/removed",
    modified: "/head_commit/modified",
};

const fn pull_request_shape(kind: EventKind, name: &'static str) -> EventShape {
    EventShape {
        kind,
        name,
        branch: "/pull_request/head/ref",
        sha: "/pull_request/head/sha",
        author_email: None,
        timestamp: None,
        files: None,
    }
}

static EVENT_SHAPES: [EventShape; 5] = [
    EventShape {
        kind: EventKind::Push,
        name: "push",
        branch: "/ref",
        sha: "/head_commit/id",
        author_email: Some("/head_commit/author/email"),
        timestamp: Some("/head_commit/timestamp"),
        files: Some(PUSH_FILES),
    },
    pull_request_shape(EventKind::PullRequest, "pull_request"),
    pull_request_shape(EventKind::PullRequestTarget, "pull_request_target"),
    pull_request_shape(EventKind::PullRequestReview, "pull_request_review"),
    pull_request_shape(
        EventKind::PullRequestReviewComment,
        "pull_request_review_comment",
    ),
];

impl EventKind {
    pub fn parse(name: &str) -> Result<Self> {
        EVENT_SHAPES
            .iter()
            .find(|shape| shape.name == name.trim())
            .map(|shape| shape.kind)
            .ok_or_else(|| Error::event_unsupported_kind(name))
    }

    pub fn as_str(&self) -> &'static str {
        self.shape().name
    }

    fn shape(&self) -> &'static EventShape {
        EVENT_SHAPES
            .iter()
            .find(|shape| shape.kind == *self)
            .unwrap_or(&EVENT_SHAPES[0])
    }
}

/// Identity of the commit a run reports on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitContext {
    pub event: EventKind,
    pub branch: String,
    pub sha: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<FixedOffset>>,
}

/// A parsed triggering event.
#[derive(Debug, Clone)]
pub struct TriggerEvent {
    pub kind: EventKind,
    pub payload: Value,
}

impl TriggerEvent {
    pub fn new(kind: EventKind, payload: Value) -> Self {
        Self { kind, payload }
    }

    /// Load the payload file the pipeline wrote for this run.
    pub fn load(event_name: &str, path: &Path) -> Result<Self> {
        let kind = EventKind::parse(event_name)?;
        let display = path.display().to_string();
        let payload = io::read_json(
            path,
            |e| Error::event_unreadable(display.clone(), e.to_string()),
            |e| Error::event_unreadable(display.clone(), e.to_string()),
        )?;
        Ok(Self::new(kind, payload))
    }

    pub fn commit_context(&self) -> Result<CommitContext> {
        let shape = self.kind.shape();

        let branch = self.required_str(shape.branch)?;
        let branch = branch.strip_prefix("refs/heads/").unwrap_or(branch);
        let sha = self.required_str(shape.sha)?;

        let author_email = shape
            .author_email
            .and_then(|pointer| self.optional_str(pointer))
            .map(str::to_string);
        let timestamp = shape
            .timestamp
            .and_then(|pointer| self.optional_str(pointer))
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok());

        Ok(CommitContext {
            event: self.kind,
            branch: branch.to_string(),
            sha: sha.to_string(),
            author_email,
            timestamp,
        })
    }

    /// Changed files carried in the payload itself.
    ///
    /// Returns None when this event kind (or this particular payload) has no
    /// file lists and the commit must be fetched instead.
    pub fn changed_files(&self) -> Option<Vec<FileChangeRecord>> {
        let pointers = self.kind.shape().files.as_ref()?;

        let added = self.string_list(pointers.added)?;
        let removed = self.string_list(pointers.removed)?;
        let modified = self.string_list(pointers.modified).unwrap_or_default();

        let records = added
            .into_iter()
            .map(FileChangeRecord::added)
            .chain(removed.into_iter().map(FileChangeRecord::removed))
            .chain(modified.into_iter().map(FileChangeRecord::modified))
            .collect();
        Some(records)
    }

    fn optional_str(&self, pointer: &str) -> Option<&str> {
        self.payload
            .pointer(pointer)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    fn required_str(&self, pointer: &str) -> Result<&str> {
        self.optional_str(pointer)
            .ok_or_else(|| Error::event_missing_field(self.kind.as_str(), pointer))
    }

    fn string_list(&self, pointer: &str) -> Option<Vec<String>> {
        let items = self.payload.pointer(pointer)?.as_array()?;
        Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
        )
    }
}
