//! Shared blocking HTTP plumbing for the remote collaborators.
//!
//! Requests are single-shot: no retries, and the client timeout is disabled.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

const USER_AGENT: &str = concat!("tsgauge/", env!("CARGO_PKG_VERSION"));

pub(crate) fn client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(None::<Duration>)
        .build()
        .map_err(|e| Error::internal_io(e.to_string(), Some("create HTTP client".to_string())))
}

pub(crate) fn transport_error(url: &str, e: reqwest::Error) -> Error {
    Error::http_transport_failed(redact(url), e.without_url().to_string())
}

/// Reject non-2xx responses, keeping the body for diagnostics.
pub(crate) fn require_success(url: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    Err(Error::http_status_failed(redact(url), status.as_u16(), body))
}

pub(crate) fn parse_json_response<T: DeserializeOwned>(
    url: &str,
    response: Response,
    source: &str,
) -> Result<T> {
    let response = require_success(url, response)?;
    let body = response.text().map_err(|e| transport_error(url, e))?;

    serde_json::from_str(&body).map_err(|e| Error::response_malformed(source, e.to_string()))
}

/// Drop the query string so credentials passed as parameters never reach logs.
fn redact(url: &str) -> String {
    match url.split_once('?') {
        Some((base, _)) => base.to_string(),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_drops_query() {
        assert_eq!(
            redact("https://api.example.test/v1/series?api_key=secret"),
            "https://api.example.test/v1/series"
        );
        assert_eq!(redact("https://api.example.test/x"), "https://api.example.test/x");
    }

    #[test]
    fn client_builds() {
        assert!(client().is_ok());
    }
}
