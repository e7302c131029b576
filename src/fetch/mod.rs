//! Retrieval of the cumulative tracking dataset over HTTP.

pub mod auth;
mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result};
use bytes::Bytes;
use chrono::NaiveDate;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How often and how patiently a failed fetch is retried.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub retries: u32,
    /// Delay before retry `n` is `backoff * n`.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            backoff: Duration::from_secs(2),
        }
    }
}

pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?.error_for_status()?;
    Ok(resp.bytes().await?.to_vec())
}

/// Builds the tracking-data endpoint for an inclusive date range.
pub fn tracking_data_url(base_url: &str, start: NaiveDate, end: NaiveDate) -> Result<String> {
    let endpoint = format!("{}/api/v1/tracking-data", base_url.trim_end_matches('/'));
    let url = reqwest::Url::parse_with_params(
        &endpoint,
        &[
            ("start_date", start.format("%Y-%m-%d").to_string()),
            ("end_date", end.format("%Y-%m-%d").to_string()),
        ],
    )
    .with_context(|| format!("invalid base URL '{base_url}'"))?;
    Ok(url.into())
}

/// GETs `url`, retrying timeouts, connection failures and 5xx responses.
///
/// Client errors (4xx) are not retried.
#[tracing::instrument(skip(client, policy), fields(retries = policy.retries))]
pub async fn fetch_tracking_data<C: HttpClient>(
    client: &C,
    url: &str,
    policy: RetryPolicy,
) -> Result<Bytes> {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

        let outcome = match client.execute(req).await {
            Ok(resp) => match resp.error_for_status() {
                Ok(resp) => resp.bytes().await,
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };

        match outcome {
            Ok(body) => {
                info!(attempt, bytes = body.len(), "Tracking data received");
                return Ok(body);
            }
            Err(e) if attempt <= policy.retries && is_retryable(&e) => {
                warn!(attempt, error = %e, "Tracking data fetch failed, retrying");
                tokio::time::sleep(policy.backoff * attempt).await;
            }
            Err(e) => {
                debug!(attempt, "Giving up on tracking data fetch");
                return Err(e).context("failed to fetch tracking data");
            }
        }
    }
}

fn is_retryable(err: &reqwest::Error) -> bool {
    if let Some(status) = err.status() {
        return status.is_server_error();
    }
    err.is_timeout() || err.is_connect() || err.is_body()
}
