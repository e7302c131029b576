//! Explicit configuration handed to the pipeline and its collaborators.

use crate::error::{RollupError, RollupResult};
use anyhow::{Context, Result};
use std::time::Duration;

/// Number of consecutive fixes averaged into one output point.
pub const DEFAULT_WINDOW_SIZE: usize = 7;

pub const DEFAULT_BASE_URL: &str = "https://api-next.africawildlifetracking.com";

pub const DEFAULT_PRIVACY_NOTE: &str = "Locations are rolling averages over consecutive GPS fixes \
     per animal, rounded to 6 decimal places. Raw fixes are not published.";

/// Settings for the aggregation core.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    window_size: usize,
    privacy_note: String,
}

impl PipelineConfig {
    pub fn new(window_size: usize, privacy_note: String) -> RollupResult<Self> {
        if window_size == 0 {
            return Err(RollupError::InvalidConfig(
                "window size must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            window_size,
            privacy_note,
        })
    }

    /// Default privacy note with a custom window size.
    pub fn with_window_size(window_size: usize) -> RollupResult<Self> {
        Self::new(window_size, DEFAULT_PRIVACY_NOTE.to_string())
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn privacy_note(&self) -> &str {
        &self.privacy_note
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            privacy_note: DEFAULT_PRIVACY_NOTE.to_string(),
        }
    }
}

/// Credentials and transport settings for the tracking API.
#[derive(Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub retries: u32,
}

impl ApiConfig {
    /// Reads `AWT_BASE_URL`, `AWT_USERNAME`, `AWT_PASSWORD`, `AWT_API_KEY`,
    /// `AWT_TIMEOUT_SECS` (default 60) and `AWT_RETRIES` (default 2).
    ///
    /// All missing required variables are reported in a single error.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let missing: Vec<&str> = ["AWT_USERNAME", "AWT_PASSWORD"]
            .into_iter()
            .filter(|name| get(*name).is_none())
            .collect();
        if !missing.is_empty() {
            anyhow::bail!(
                "Missing required environment variables: {}",
                missing.join(", ")
            );
        }

        let timeout_secs = match get("AWT_TIMEOUT_SECS") {
            Some(v) => v
                .parse::<u64>()
                .with_context(|| format!("AWT_TIMEOUT_SECS is not a number: '{v}'"))?,
            None => 60,
        };
        let retries = match get("AWT_RETRIES") {
            Some(v) => v
                .parse::<u32>()
                .with_context(|| format!("AWT_RETRIES is not a number: '{v}'"))?,
            None => 2,
        };

        Ok(Self {
            base_url: get("AWT_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            username: get("AWT_USERNAME").unwrap_or_default(),
            password: get("AWT_PASSWORD").unwrap_or_default(),
            api_key: get("AWT_API_KEY"),
            timeout: Duration::from_secs(timeout_secs),
            retries,
        })
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("retries", &self.retries)
            .finish()
    }
}

/// Where results are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Local { dir: String },
    S3 { bucket: String },
}
