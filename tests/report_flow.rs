use std::sync::Mutex;

use serde_json::json;
use tsgauge::conversion::FileChangeRecord;
use tsgauge::error::{Error, ErrorCode, Result, ToolFailedDetails};
use tsgauge::event::{EventKind, TriggerEvent};
use tsgauge::github::{CommitDetails, CommitSource};
use tsgauge::line_count::{LineCountReport, LineCounter};
use tsgauge::metrics::{MetricType, MetricsSink, SeriesPayload};
use tsgauge::report::{self, Collaborators, Delivery, MetricJob, OutcomeStatus, ReportPlan};

const NOW: i64 = 1_710_000_000;

const CLOC_OUTPUT: &str = r#"{
    "header": { "cloc_url": "github.com/AlDanial/cloc", "n_files": 3 },
    "TypeScript": { "nFiles": 1, "blank": 4, "comment": 0, "code": 300 },
    "JavaScript": { "nFiles": 2, "blank": 9, "comment": 2, "code": 700 },
    "SUM": { "nFiles": 3, "blank": 13, "comment": 2, "code": 1000 }
}"#;

struct FixedCounter;

impl LineCounter for FixedCounter {
    fn count(&self, _source_path: &str) -> Result<LineCountReport> {
        LineCountReport::parse(CLOC_OUTPUT)
    }
}

struct FailingCounter;

impl LineCounter for FailingCounter {
    fn count(&self, _source_path: &str) -> Result<LineCountReport> {
        Err(Error::tool_failed(ToolFailedDetails {
            command: "cloc --json static".to_string(),
            exit_code: Some(1),
            stderr: "npm ERR! could not determine executable to run".to_string(),
        }))
    }
}

struct PanickingCounter;

impl LineCounter for PanickingCounter {
    fn count(&self, _source_path: &str) -> Result<LineCountReport> {
        panic!("counter exploded");
    }
}

struct FixedCommit(CommitDetails);

impl CommitSource for FixedCommit {
    fn fetch_commit(&self, _sha: &str) -> Result<CommitDetails> {
        Ok(self.0.clone())
    }
}

#[derive(Default)]
struct RecordingSink {
    submitted: Mutex<Vec<SeriesPayload>>,
}

impl RecordingSink {
    fn submitted(&self) -> Vec<SeriesPayload> {
        self.submitted.lock().unwrap().clone()
    }
}

impl MetricsSink for RecordingSink {
    fn submit(&self, payload: &SeriesPayload) -> Result<()> {
        self.submitted.lock().unwrap().push(payload.clone());
        Ok(())
    }
}

struct RejectingSink;

impl MetricsSink for RejectingSink {
    fn submit(&self, _payload: &SeriesPayload) -> Result<()> {
        Err(Error::http_status_failed(
            "https://metrics.example.test/api/v1/series",
            403,
            "{\"errors\":[\"Forbidden\"]}",
        ))
    }
}

fn plan() -> ReportPlan {
    ReportPlan {
        source_path: "static".to_string(),
        typed_language: "TypeScript".to_string(),
        progress_metric: "frontend.ts.progress".to_string(),
        conversions_metric: "frontend.ts.converted".to_string(),
        host: "github-actions".to_string(),
    }
}

fn push_event(added: &[&str], removed: &[&str]) -> Result<TriggerEvent> {
    Ok(TriggerEvent::new(
        EventKind::Push,
        json!({
            "ref": "refs/heads/main",
            "head_commit": {
                "id": "9f8e7d",
                "timestamp": "2024-03-05T10:15:00-05:00",
                "author": { "email": "dev@example.com" },
                "added": added,
                "removed": removed,
                "modified": ["package.json"]
            }
        }),
    ))
}

#[test]
fn push_posts_ratio_and_conversions() {
    let sink = RecordingSink::default();
    let collaborators = Collaborators {
        line_counter: &FixedCounter,
        commits: None,
        delivery: Delivery::Submit(&sink),
    };
    let event = push_event(
        &["static/ld/flags.ts", "static/ld/Container.tsx"],
        &["static/ld/flags.js", "static/ld/Container.js"],
    );

    let output = report::run(&plan(), &event, &collaborators, NOW);

    assert!(!output.has_failures());
    let ratio = &output.metrics[0];
    assert_eq!(ratio.job, MetricJob::Ratio);
    assert_eq!(ratio.status, OutcomeStatus::Posted);
    assert_eq!(ratio.value, Some(0.3));

    let conversions = &output.metrics[1];
    assert_eq!(conversions.job, MetricJob::Conversions);
    assert_eq!(conversions.status, OutcomeStatus::Posted);
    assert_eq!(conversions.value, Some(2.0));

    let mut submitted = sink.submitted();
    submitted.sort_by(|a, b| a.series[0].metric.cmp(&b.series[0].metric));
    assert_eq!(submitted.len(), 2);

    let count_series = &submitted[0].series[0];
    assert_eq!(count_series.metric, "frontend.ts.converted");
    assert_eq!(count_series.metric_type, MetricType::Count);
    assert_eq!(count_series.points, vec![(NOW, 2.0)]);
    assert_eq!(count_series.tags, vec!["author:dev@example.com", "branch:main"]);

    let gauge_series = &submitted[1].series[0];
    assert_eq!(gauge_series.metric, "frontend.ts.progress");
    assert_eq!(gauge_series.metric_type, MetricType::Gauge);
    assert_eq!(gauge_series.points, vec![(NOW, 0.3)]);
    assert_eq!(gauge_series.host, "github-actions");
}

#[test]
fn zero_conversions_are_not_posted() {
    let sink = RecordingSink::default();
    let collaborators = Collaborators {
        line_counter: &FixedCounter,
        commits: None,
        delivery: Delivery::Submit(&sink),
    };
    let event = push_event(&["static/new.ts"], &["static/old.js"]);

    let output = report::run(&plan(), &event, &collaborators, NOW);

    assert!(!output.has_failures());
    assert_eq!(output.metrics[1].status, OutcomeStatus::Skipped);
    assert!(output.metrics[1].payload.is_none());

    let submitted = sink.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].series[0].metric, "frontend.ts.progress");
}

#[test]
fn counter_failure_does_not_block_conversions() {
    let sink = RecordingSink::default();
    let collaborators = Collaborators {
        line_counter: &FailingCounter,
        commits: None,
        delivery: Delivery::Submit(&sink),
    };
    let event = push_event(&["static/a.ts"], &["static/a.js"]);

    let output = report::run(&plan(), &event, &collaborators, NOW);

    assert_eq!(output.failed, 1);
    let ratio = &output.metrics[0];
    assert_eq!(ratio.status, OutcomeStatus::Failed);
    assert_eq!(ratio.error.as_ref().unwrap().code, "tool.failed");
    assert_eq!(output.metrics[1].status, OutcomeStatus::Posted);

    let submitted = sink.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].series[0].metric, "frontend.ts.converted");
}

#[test]
fn panicking_job_is_reported_as_failed() {
    let sink = RecordingSink::default();
    let collaborators = Collaborators {
        line_counter: &PanickingCounter,
        commits: None,
        delivery: Delivery::Submit(&sink),
    };
    let event = push_event(&["static/a.ts"], &["static/a.js"]);

    let output = report::run(&plan(), &event, &collaborators, NOW);

    assert_eq!(output.failed, 1);
    assert_eq!(
        output.metrics[0].error.as_ref().unwrap().code,
        ErrorCode::InternalUnexpected.as_str()
    );
    assert_eq!(output.metrics[1].status, OutcomeStatus::Posted);
}

#[test]
fn unresolvable_event_fails_both_jobs() {
    let sink = RecordingSink::default();
    let collaborators = Collaborators {
        line_counter: &FixedCounter,
        commits: None,
        delivery: Delivery::Submit(&sink),
    };
    let event = Err(Error::event_unsupported_kind("workflow_dispatch"));

    let output = report::run(&plan(), &event, &collaborators, NOW);

    assert_eq!(output.failed, 2);
    for outcome in &output.metrics {
        assert_eq!(outcome.error.as_ref().unwrap().code, "event.unsupported_kind");
    }
    assert!(sink.submitted().is_empty());
}

#[test]
fn dry_run_builds_payloads_without_posting() {
    let collaborators = Collaborators {
        line_counter: &FixedCounter,
        commits: None,
        delivery: Delivery::DryRun,
    };
    let event = push_event(&["static/a.ts"], &["static/a.js"]);

    let output = report::run(&plan(), &event, &collaborators, NOW);

    assert!(!output.has_failures());
    for outcome in &output.metrics {
        assert_eq!(outcome.status, OutcomeStatus::DryRun);
        assert!(outcome.payload.is_some());
    }
    let conversions = output.metrics[1].payload.as_ref().unwrap();
    assert_eq!(conversions.series[0].points, vec![(NOW, 1.0)]);
}

#[test]
fn pull_request_files_and_author_come_from_commit_lookup() {
    let sink = RecordingSink::default();
    let commits = FixedCommit(CommitDetails {
        files: vec![
            FileChangeRecord::renamed(
                "static/ld/components/ManageFlagTargetingContainer.js",
                "static/ld/components/ManageFlagTargetingContainer.tsx",
            ),
            FileChangeRecord::renamed("static/ld/flags.js", "static/ld/flags.ts"),
        ],
        author_email: Some("reviewer@example.com".to_string()),
        timestamp: chrono::DateTime::parse_from_rfc3339("2024-03-05T15:15:00Z").ok(),
    });
    let collaborators = Collaborators {
        line_counter: &FixedCounter,
        commits: Some(&commits),
        delivery: Delivery::Submit(&sink),
    };
    let event = Ok(TriggerEvent::new(
        EventKind::PullRequest,
        json!({ "pull_request": { "head": { "ref": "convert-flags", "sha": "abc123" } } }),
    ));

    let output = report::run(&plan(), &event, &collaborators, NOW);

    assert!(!output.has_failures());
    assert_eq!(output.metrics[1].value, Some(2.0));

    let submitted = sink.submitted();
    let count = submitted
        .iter()
        .find(|p| p.series[0].metric == "frontend.ts.converted")
        .unwrap();
    assert_eq!(count.series[0].points, vec![(NOW, 2.0)]);
    let committed = output.metrics[1].detail.as_ref().unwrap()["timestamp"]
        .as_str()
        .and_then(|raw| chrono::DateTime::parse_from_rfc3339(raw).ok())
        .unwrap();
    assert_eq!(committed.timestamp(), 1_709_651_700);
    assert_eq!(
        count.series[0].tags,
        vec!["author:reviewer@example.com", "branch:convert-flags"]
    );

    // The ratio gauge only has event metadata, which carries no author.
    let gauge = submitted
        .iter()
        .find(|p| p.series[0].metric == "frontend.ts.progress")
        .unwrap();
    assert_eq!(gauge.series[0].tags[0], "author:unknown");
}

#[test]
fn branch_deletion_push_is_an_input_error() {
    let sink = RecordingSink::default();
    let commits = FixedCommit(CommitDetails::default());
    let collaborators = Collaborators {
        line_counter: &FixedCounter,
        commits: Some(&commits),
        delivery: Delivery::Submit(&sink),
    };
    let event = Ok(TriggerEvent::new(
        EventKind::Push,
        json!({
            "ref": "refs/heads/old-branch",
            "after": "0000000000000000000000000000000000000000",
            "deleted": true,
            "head_commit": null
        }),
    ));

    let output = report::run(&plan(), &event, &collaborators, NOW);

    assert_eq!(output.failed, 2);
    for outcome in &output.metrics {
        assert_eq!(outcome.error.as_ref().unwrap().code, "event.missing_field");
    }
    assert!(sink.submitted().is_empty());
}

#[test]
fn pull_request_without_commit_lookup_fails_conversions_only() {
    let sink = RecordingSink::default();
    let collaborators = Collaborators {
        line_counter: &FixedCounter,
        commits: None,
        delivery: Delivery::Submit(&sink),
    };
    let event = Ok(TriggerEvent::new(
        EventKind::PullRequestTarget,
        json!({ "pull_request": { "head": { "ref": "convert", "sha": "abc123" } } }),
    ));

    let output = report::run(&plan(), &event, &collaborators, NOW);

    assert_eq!(output.failed, 1);
    assert_eq!(output.metrics[0].status, OutcomeStatus::Posted);
    assert_eq!(
        output.metrics[1].error.as_ref().unwrap().code,
        "config.missing_key"
    );
}

#[test]
fn rejected_submission_fails_each_job() {
    let collaborators = Collaborators {
        line_counter: &FixedCounter,
        commits: None,
        delivery: Delivery::Submit(&RejectingSink),
    };
    let event = push_event(&["static/a.ts"], &["static/a.js"]);

    let output = report::run(&plan(), &event, &collaborators, NOW);

    assert_eq!(output.failed, 2);
    for outcome in &output.metrics {
        let error = outcome.error.as_ref().unwrap();
        assert_eq!(error.code, "http.status_failed");
        assert_eq!(error.details["status"], 403);
    }
}
