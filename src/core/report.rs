//! Report orchestration: the progress-ratio and files-converted jobs.
//!
//! The two jobs share no state and run on their own threads. Each one either
//! delivers its single data point or fails on its own; a failure never stops
//! the sibling, and every failure ends up in the returned `ReportOutput`.

use std::thread;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use serde_json::Value;

use crate::config::{Settings, ENV_REPOSITORY};
use crate::conversion::{self, Conversion};
use crate::error::{Error, Hint, Result};
use crate::event::{CommitContext, TriggerEvent};
use crate::github::CommitSource;
use crate::line_count::{CodeRatio, LineCounter};
use crate::metrics::{self, MetricType, MetricsSink, Series, SeriesPayload};

/// Everything the jobs need from settings, validated up front.
#[derive(Debug, Clone)]
pub struct ReportPlan {
    pub source_path: String,
    pub typed_language: String,
    pub progress_metric: String,
    pub conversions_metric: String,
    pub host: String,
}

impl ReportPlan {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            source_path: settings.require_source_path()?.to_string(),
            typed_language: settings.typed_language.clone(),
            progress_metric: settings.require_progress_metric()?.to_string(),
            conversions_metric: settings.require_conversions_metric()?.to_string(),
            host: settings.metrics_host.clone(),
        })
    }
}

pub enum Delivery<'a> {
    Submit(&'a dyn MetricsSink),
    DryRun,
}

pub struct Collaborators<'a> {
    pub line_counter: &'a dyn LineCounter,
    /// Needed only when the event carries no file lists.
    pub commits: Option<&'a dyn CommitSource>,
    pub delivery: Delivery<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileSource {
    Event,
    Api,
}

/// Conversions found in one commit, with the metadata used for tagging.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitConversionReport {
    pub count: usize,
    pub conversions: Vec<Conversion>,
    pub branch: String,
    pub sha: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub file_source: FileSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricJob {
    Ratio,
    Conversions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Posted,
    DryRun,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutcomeError {
    pub code: String,
    pub message: String,
    pub details: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<Hint>,
}

impl From<&Error> for OutcomeError {
    fn from(err: &Error) -> Self {
        Self {
            code: err.code.as_str().to_string(),
            message: err.message.clone(),
            details: err.details.clone(),
            hints: err.hints.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricOutcome {
    pub job: MetricJob,
    pub metric: String,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
    /// The payload that was (or, in a dry run, would have been) submitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<SeriesPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<OutcomeError>,
}

impl MetricOutcome {
    fn failed(job: MetricJob, metric: &str, err: &Error) -> Self {
        Self {
            job,
            metric: metric.to_string(),
            status: OutcomeStatus::Failed,
            value: None,
            detail: None,
            payload: None,
            error: Some(err.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportOutput {
    pub metrics: Vec<MetricOutcome>,
    pub failed: usize,
}

impl ReportOutput {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Run both metric jobs and collect their outcomes.
///
/// `event` is the already-loaded trigger event, or the error loading it; each
/// job that needs it reports that error as its own failure.
pub fn run(
    plan: &ReportPlan,
    event: &Result<TriggerEvent>,
    collaborators: &Collaborators<'_>,
    now: i64,
) -> ReportOutput {
    let (ratio, conversions) = thread::scope(|scope| {
        let ratio = scope.spawn(|| ratio_job(plan, event, collaborators, now));
        let conversions = scope.spawn(|| conversions_job(plan, event, collaborators, now));
        (
            ratio.join().unwrap_or_else(|_| Err(job_panicked())),
            conversions.join().unwrap_or_else(|_| Err(job_panicked())),
        )
    });

    let metrics = vec![
        settle(MetricJob::Ratio, &plan.progress_metric, plan, event, ratio),
        settle(
            MetricJob::Conversions,
            &plan.conversions_metric,
            plan,
            event,
            conversions,
        ),
    ];
    let failed = metrics
        .iter()
        .filter(|m| m.status == OutcomeStatus::Failed)
        .count();

    ReportOutput { metrics, failed }
}

/// Resolve a commit's changed files and count its conversions.
///
/// Files come from the event body when it has them; otherwise the commit is
/// fetched, which also fills in author and timestamp when the event lacks them.
pub fn resolve_conversions(
    event: &TriggerEvent,
    commits: Option<&dyn CommitSource>,
) -> Result<CommitConversionReport> {
    let context = event.commit_context()?;

    let (files, author_email, timestamp, file_source) = match event.changed_files() {
        Some(files) => (
            files,
            context.author_email.clone(),
            context.timestamp,
            FileSource::Event,
        ),
        None => {
            let source = commits.ok_or_else(|| {
                Error::config_missing_key("repository", Some(ENV_REPOSITORY.to_string()))
                    .with_hint("The event has no file list, so the commit must be fetched")
            })?;
            let details = source.fetch_commit(&context.sha)?;
            (
                details.files,
                context.author_email.clone().or(details.author_email),
                context.timestamp.or(details.timestamp),
                FileSource::Api,
            )
        }
    };

    let conversions = conversion::find_conversions(&files);
    Ok(CommitConversionReport {
        count: conversions.len(),
        conversions,
        branch: context.branch,
        sha: context.sha,
        author_email,
        timestamp,
        file_source,
    })
}

/// Tags come from event metadata only; pull-request events carry no author,
/// so the gauge is tagged `author:unknown` there.
fn ratio_job(
    plan: &ReportPlan,
    event: &Result<TriggerEvent>,
    collaborators: &Collaborators<'_>,
    now: i64,
) -> Result<MetricOutcome> {
    let counts = collaborators.line_counter.count(&plan.source_path)?;
    let ratio: CodeRatio = counts.code_ratio(&plan.typed_language, &plan.source_path)?;
    crate::log_status!("ratio", "{} = {:.4}", plan.typed_language, ratio.ratio);

    let context: CommitContext = loaded(event)?.commit_context()?;
    let series = Series::point(
        MetricType::Gauge,
        &plan.host,
        &plan.progress_metric,
        now,
        ratio.ratio,
        metrics::commit_tags(context.author_email.as_deref(), &context.branch),
    );

    let status = deliver(&collaborators.delivery, &series)?;
    Ok(MetricOutcome {
        job: MetricJob::Ratio,
        metric: plan.progress_metric.clone(),
        status,
        value: Some(ratio.ratio),
        detail: serde_json::to_value(ratio).ok(),
        payload: Some(series.into_payload()),
        error: None,
    })
}

fn conversions_job(
    plan: &ReportPlan,
    event: &Result<TriggerEvent>,
    collaborators: &Collaborators<'_>,
    now: i64,
) -> Result<MetricOutcome> {
    let report = resolve_conversions(loaded(event)?, collaborators.commits)?;
    crate::log_status!("conversions", "{} file(s) converted in {}", report.count, report.sha);
    let detail = serde_json::to_value(&report).ok();

    if report.count == 0 {
        return Ok(MetricOutcome {
            job: MetricJob::Conversions,
            metric: plan.conversions_metric.clone(),
            status: OutcomeStatus::Skipped,
            value: Some(0.0),
            detail,
            payload: None,
            error: None,
        });
    }

    let series = Series::point(
        MetricType::Count,
        &plan.host,
        &plan.conversions_metric,
        now,
        report.count as f64,
        metrics::commit_tags(report.author_email.as_deref(), &report.branch),
    );

    let status = deliver(&collaborators.delivery, &series)?;
    Ok(MetricOutcome {
        job: MetricJob::Conversions,
        metric: plan.conversions_metric.clone(),
        status,
        value: Some(report.count as f64),
        detail,
        payload: Some(series.into_payload()),
        error: None,
    })
}

fn loaded(event: &Result<TriggerEvent>) -> Result<&TriggerEvent> {
    event.as_ref().map_err(Clone::clone)
}

fn deliver(delivery: &Delivery<'_>, series: &Series) -> Result<OutcomeStatus> {
    match delivery {
        Delivery::Submit(sink) => {
            sink.submit(&series.clone().into_payload())?;
            Ok(OutcomeStatus::Posted)
        }
        Delivery::DryRun => Ok(OutcomeStatus::DryRun),
    }
}

fn job_panicked() -> Error {
    Error::internal_unexpected("metric job panicked")
}

fn settle(
    job: MetricJob,
    metric: &str,
    plan: &ReportPlan,
    event: &Result<TriggerEvent>,
    result: Result<MetricOutcome>,
) -> MetricOutcome {
    match result {
        Ok(outcome) => {
            tracing::info!(metric, status = ?outcome.status, "metric job finished");
            outcome
        }
        Err(err) => {
            let event_kind = event.as_ref().map(|e| e.kind.as_str()).unwrap_or("unresolved");
            tracing::error!(
                metric,
                job = ?job,
                code = err.code.as_str(),
                kind = ?err.kind(),
                event = event_kind,
                source_path = %plan.source_path,
                details = %err.details,
                "{}",
                err.message
            );
            MetricOutcome::failed(job, metric, &err)
        }
    }
}
