use std::path::PathBuf;

use clap::Args;

use tsgauge::config::{self, Overrides, Settings};
use tsgauge::event::TriggerEvent;
use tsgauge::github::GitHubClient;

pub type CmdResult<T> = tsgauge::Result<(T, i32)>;

/// Settings shared by every command.
///
/// Each flag falls back to the variable the pipeline sets for the step, so a
/// workflow needs no flags at all. Values also load from `--config`.
#[derive(Args, Debug, Default)]
pub(crate) struct GlobalArgs {
    /// JSON config file (camelCase keys, e.g. {"sourcePath": "static"})
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory the line counter measures
    #[arg(long, global = true, env = config::ENV_SOURCE_PATH)]
    pub source_path: Option<String>,

    /// Metric name for the typed-code ratio gauge
    #[arg(long, global = true, env = config::ENV_PROGRESS_METRIC)]
    pub progress_metric: Option<String>,

    /// Metric name for the files-converted count
    #[arg(long, global = true, env = config::ENV_CONVERSIONS_METRIC)]
    pub conversions_metric: Option<String>,

    /// Metrics backend API key
    #[arg(long, global = true, env = config::ENV_METRICS_API_KEY, hide_env_values = true)]
    pub metrics_api_key: Option<String>,

    /// Series submission endpoint
    #[arg(long, global = true, value_name = "URL")]
    pub metrics_url: Option<String>,

    /// Host reported with every data point
    #[arg(long, global = true)]
    pub metrics_host: Option<String>,

    /// Token for commit lookups
    #[arg(long, global = true, env = config::ENV_GITHUB_TOKEN, hide_env_values = true)]
    pub github_token: Option<String>,

    #[arg(long, global = true, env = config::ENV_GITHUB_API_URL, value_name = "URL")]
    pub github_api_url: Option<String>,

    /// Repository as <owner>/<name>
    #[arg(long, global = true, env = config::ENV_REPOSITORY)]
    pub repository: Option<String>,

    /// Event payload file written by the pipeline
    #[arg(long, global = true, env = config::ENV_EVENT_PATH, value_name = "FILE")]
    pub event_path: Option<PathBuf>,

    /// Event name (push, pull_request, ...)
    #[arg(long, global = true, env = config::ENV_EVENT_NAME)]
    pub event_name: Option<String>,

    /// Line counter command; the source path is appended
    #[arg(long, global = true, value_name = "COMMAND")]
    pub line_counter: Option<String>,

    /// Language name counted as typed code
    #[arg(long, global = true)]
    pub typed_language: Option<String>,
}

impl GlobalArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            config_path: self.config.clone(),
            source_path: self.source_path.clone(),
            progress_metric: self.progress_metric.clone(),
            conversions_metric: self.conversions_metric.clone(),
            metrics_api_key: self.metrics_api_key.clone(),
            metrics_url: self.metrics_url.clone(),
            metrics_host: self.metrics_host.clone(),
            github_token: self.github_token.clone(),
            github_api_url: self.github_api_url.clone(),
            repository: self.repository.clone(),
            event_path: self
                .event_path
                .clone()
                .filter(|path| !path.as_os_str().is_empty()),
            event_name: self.event_name.clone(),
            line_counter: self.line_counter.clone(),
            typed_language: self.typed_language.clone(),
        }
    }

    pub fn settings(&self) -> tsgauge::Result<Settings> {
        Settings::resolve(self.overrides())
    }
}

/// Load the triggering event named by settings.
pub(crate) fn load_event(settings: &Settings) -> tsgauge::Result<TriggerEvent> {
    let name = settings.require_event_name()?;
    let path = settings.require_event_path()?;
    TriggerEvent::load(name, path)
}

/// Commit lookups are available only when the repository is known.
pub(crate) fn commit_source(settings: &Settings) -> tsgauge::Result<Option<GitHubClient>> {
    settings
        .repository
        .as_deref()
        .map(|repository| {
            GitHubClient::new(
                &settings.github_api_url,
                repository,
                settings.github_token.clone(),
            )
        })
        .transpose()
}

pub mod count;
pub mod ratio;
pub mod report;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (tsgauge::Result<serde_json::Value>, i32) {
    match command {
        crate::Commands::Report(args) => dispatch!(args, global, report),
        crate::Commands::Count(args) => dispatch!(args, global, count),
        crate::Commands::Ratio(args) => dispatch!(args, global, ratio),
    }
}
