//! Time-series submission to the metrics backend.

use reqwest::blocking::Client;
use serde::Serialize;

use crate::error::Result;
use crate::http;

pub const UNKNOWN_AUTHOR: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    Gauge,
    Count,
}

/// One metric with its data points, in the backend's wire format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub host: String,
    pub metric: String,
    #[serde(rename = "type")]
    pub metric_type: MetricType,
    /// `[unix_seconds, value]` pairs.
    pub points: Vec<(i64, f64)>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPayload {
    pub series: Vec<Series>,
}

impl Series {
    pub fn point(
        metric_type: MetricType,
        host: &str,
        metric: &str,
        timestamp: i64,
        value: f64,
        tags: Vec<String>,
    ) -> Self {
        Self {
            host: host.to_string(),
            metric: metric.to_string(),
            metric_type,
            points: vec![(timestamp, value)],
            tags,
        }
    }

    pub fn into_payload(self) -> SeriesPayload {
        SeriesPayload { series: vec![self] }
    }
}

pub fn commit_tags(author_email: Option<&str>, branch: &str) -> Vec<String> {
    vec![
        format!("author:{}", author_email.unwrap_or(UNKNOWN_AUTHOR)),
        format!("branch:{}", branch),
    ]
}

/// Destination for finished data points.
pub trait MetricsSink: Send + Sync {
    fn submit(&self, payload: &SeriesPayload) -> Result<()>;
}

pub struct MetricsClient {
    client: Client,
    url: String,
    api_key: String,
}

impl MetricsClient {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: http::client()?,
            url: url.into(),
            api_key: api_key.into(),
        })
    }
}

impl MetricsSink for MetricsClient {
    fn submit(&self, payload: &SeriesPayload) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .query(&[("api_key", self.api_key.as_str())])
            .json(payload)
            .send()
            .map_err(|e| http::transport_error(&self.url, e))?;

        http::require_success(&self.url, response)?;
        Ok(())
    }
}
