//! Commit lookups against the GitHub REST API.

use chrono::{DateTime, FixedOffset};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::conversion::FileChangeRecord;
use crate::error::{Error, Result};
use crate::http;

/// Source of a commit's changed-file list.
pub trait CommitSource: Send + Sync {
    fn fetch_commit(&self, sha: &str) -> Result<CommitDetails>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitDetails {
    pub files: Vec<FileChangeRecord>,
    pub author_email: Option<String>,
    pub timestamp: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    #[serde(default)]
    commit: Option<CommitBody>,
    files: Option<Vec<CommitFile>>,
}

#[derive(Debug, Deserialize)]
struct CommitBody {
    #[serde(default)]
    author: Option<GitActor>,
}

#[derive(Debug, Deserialize)]
struct GitActor {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommitFile {
    filename: String,
    status: String,
    #[serde(default)]
    previous_filename: Option<String>,
}

impl CommitFile {
    fn into_record(self) -> FileChangeRecord {
        match (self.status.as_str(), self.previous_filename) {
            ("added", _) => FileChangeRecord::added(self.filename),
            ("removed", _) => FileChangeRecord::removed(self.filename),
            ("renamed", Some(previous)) => FileChangeRecord::renamed(previous, self.filename),
            _ => FileChangeRecord::modified(self.filename),
        }
    }
}

impl CommitResponse {
    fn into_details(self) -> Result<CommitDetails> {
        let files = self
            .files
            .ok_or_else(|| Error::response_malformed("github commit", "missing 'files' array"))?;

        let author = self.commit.and_then(|c| c.author);
        let (author_email, timestamp) = match author {
            Some(actor) => (
                actor.email.filter(|e| !e.is_empty()),
                actor
                    .date
                    .as_deref()
                    .and_then(|d| DateTime::parse_from_rfc3339(d).ok()),
            ),
            None => (None, None),
        };

        Ok(CommitDetails {
            files: files.into_iter().map(CommitFile::into_record).collect(),
            author_email,
            timestamp,
        })
    }
}

pub struct GitHubClient {
    client: Client,
    api_url: String,
    repository: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(
        api_url: impl Into<String>,
        repository: impl Into<String>,
        token: Option<String>,
    ) -> Result<Self> {
        Ok(Self {
            client: http::client()?,
            api_url: api_url.into(),
            repository: repository.into(),
            token,
        })
    }

    fn commit_url(&self, sha: &str) -> String {
        format!("{}/repos/{}/commits/{}", self.api_url, self.repository, sha)
    }
}

impl CommitSource for GitHubClient {
    fn fetch_commit(&self, sha: &str) -> Result<CommitDetails> {
        let url = self.commit_url(sha);
        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json");

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().map_err(|e| http::transport_error(&url, e))?;
        let body: CommitResponse = http::parse_json_response(&url, response, "github commit")?;
        body.into_details()
    }
}
