//! Run settings, resolved once at process start and passed down explicitly.
//!
//! Precedence: explicit overrides (CLI flags, which fall back to pipeline
//! environment variables) > JSON config file > built-in defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::io;

pub const DEFAULT_METRICS_URL: &str = "https://api.datadoghq.com/api/v1/series";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_METRICS_HOST: &str = "github-actions";
pub const DEFAULT_TYPED_LANGUAGE: &str = "TypeScript";

pub const ENV_SOURCE_PATH: &str = "INPUT_SOURCE-PATH";
pub const ENV_PROGRESS_METRIC: &str = "INPUT_PROGRESS-METRIC";
pub const ENV_CONVERSIONS_METRIC: &str = "INPUT_CONVERSIONS-METRIC";
pub const ENV_METRICS_API_KEY: &str = "INPUT_METRICS-API-KEY";
pub const ENV_GITHUB_TOKEN: &str = "INPUT_GITHUB-TOKEN";
pub const ENV_EVENT_PATH: &str = "GITHUB_EVENT_PATH";
pub const ENV_EVENT_NAME: &str = "GITHUB_EVENT_NAME";
pub const ENV_REPOSITORY: &str = "GITHUB_REPOSITORY";
pub const ENV_GITHUB_API_URL: &str = "GITHUB_API_URL";

fn default_line_counter() -> Vec<String> {
    ["npx", "--quiet", "cloc", "--include-lang=TypeScript,JavaScript", "--json"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Values supplied on the command line or by the pipeline environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_path: Option<PathBuf>,
    pub source_path: Option<String>,
    pub progress_metric: Option<String>,
    pub conversions_metric: Option<String>,
    pub metrics_api_key: Option<String>,
    pub metrics_url: Option<String>,
    pub metrics_host: Option<String>,
    pub github_token: Option<String>,
    pub github_api_url: Option<String>,
    pub repository: Option<String>,
    pub event_path: Option<PathBuf>,
    pub event_name: Option<String>,
    pub line_counter: Option<String>,
    pub typed_language: Option<String>,
}

/// Shape of the optional JSON config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FileConfig {
    pub source_path: Option<String>,
    pub progress_metric: Option<String>,
    pub conversions_metric: Option<String>,
    pub metrics_api_key: Option<String>,
    pub metrics_url: Option<String>,
    pub metrics_host: Option<String>,
    pub github_token: Option<String>,
    pub github_api_url: Option<String>,
    pub repository: Option<String>,
    pub line_counter: Option<Vec<String>>,
    pub typed_language: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let display = path.display().to_string();
        io::read_json(
            path,
            |e| Error::internal_io(e.to_string(), Some(format!("read config {}", display))),
            |e| Error::config_invalid_json(display.clone(), e),
        )
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub source_path: Option<String>,
    pub progress_metric: Option<String>,
    pub conversions_metric: Option<String>,
    #[serde(skip)]
    pub metrics_api_key: Option<String>,
    pub metrics_url: String,
    pub metrics_host: String,
    #[serde(skip)]
    pub github_token: Option<String>,
    pub github_api_url: String,
    pub repository: Option<String>,
    pub event_path: Option<PathBuf>,
    pub event_name: Option<String>,
    pub line_counter: Vec<String>,
    pub typed_language: String,
}

impl Settings {
    /// Resolve settings from overrides, loading the config file they name.
    pub fn resolve(overrides: Overrides) -> Result<Self> {
        let file = match &overrides.config_path {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::merge(overrides, file)
    }

    pub fn merge(overrides: Overrides, file: FileConfig) -> Result<Self> {
        let line_counter = match overrides.line_counter {
            Some(command) => command.split_whitespace().map(str::to_string).collect(),
            None => file.line_counter.unwrap_or_else(default_line_counter),
        };
        if line_counter.is_empty() {
            return Err(Error::config_invalid_value(
                "line-counter",
                None,
                "Line counter command is empty",
            ));
        }

        let settings = Self {
            source_path: non_empty(overrides.source_path.or(file.source_path)),
            progress_metric: non_empty(overrides.progress_metric.or(file.progress_metric)),
            conversions_metric: non_empty(
                overrides.conversions_metric.or(file.conversions_metric),
            ),
            metrics_api_key: non_empty(overrides.metrics_api_key.or(file.metrics_api_key)),
            metrics_url: non_empty(overrides.metrics_url.or(file.metrics_url))
                .unwrap_or_else(|| DEFAULT_METRICS_URL.to_string()),
            metrics_host: non_empty(overrides.metrics_host.or(file.metrics_host))
                .unwrap_or_else(|| DEFAULT_METRICS_HOST.to_string()),
            github_token: non_empty(overrides.github_token.or(file.github_token)),
            github_api_url: non_empty(overrides.github_api_url.or(file.github_api_url))
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
            repository: non_empty(overrides.repository.or(file.repository)),
            event_path: overrides.event_path,
            event_name: non_empty(overrides.event_name),
            line_counter,
            typed_language: non_empty(overrides.typed_language.or(file.typed_language))
                .unwrap_or_else(|| DEFAULT_TYPED_LANGUAGE.to_string()),
        };

        if let Some(repository) = &settings.repository {
            validate_repository(repository)?;
        }

        Ok(settings)
    }

    pub fn require_source_path(&self) -> Result<&str> {
        required(&self.source_path, "source-path", ENV_SOURCE_PATH)
    }

    pub fn require_progress_metric(&self) -> Result<&str> {
        required(&self.progress_metric, "progress-metric", ENV_PROGRESS_METRIC)
    }

    pub fn require_conversions_metric(&self) -> Result<&str> {
        required(
            &self.conversions_metric,
            "conversions-metric",
            ENV_CONVERSIONS_METRIC,
        )
    }

    pub fn require_metrics_api_key(&self) -> Result<&str> {
        required(&self.metrics_api_key, "metrics-api-key", ENV_METRICS_API_KEY)
    }

    pub fn require_event_name(&self) -> Result<&str> {
        required(&self.event_name, "event-name", ENV_EVENT_NAME)
    }

    pub fn require_event_path(&self) -> Result<&Path> {
        self.event_path
            .as_deref()
            .ok_or_else(|| Error::config_missing_key("event-path", Some(ENV_EVENT_PATH.into())))
    }

    /// Line counter program and the arguments placed before the source path.
    pub fn line_counter_parts(&self) -> (&str, &[String]) {
        match self.line_counter.split_first() {
            Some((program, rest)) => (program.as_str(), rest),
            None => ("cloc", &[]),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required<'a>(value: &'a Option<String>, key: &str, env: &str) -> Result<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| Error::config_missing_key(key, Some(env.to_string())))
}

fn validate_repository(repository: &str) -> Result<()> {
    match repository.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok(())
        }
        _ => Err(Error::config_invalid_value(
            "repository",
            Some(repository.to_string()),
            "Expected <owner>/<name>",
        )),
    }
}
