//! Persistence of published documents and raw snapshots.
//!
//! [`ResultStore`] is the seam; [`LocalStore`] writes under a directory and
//! [`S3Store`] uploads to a bucket. Keys are shared between both so the same
//! layout appears on disk and in the bucket.

mod local;
mod s3;

pub use local::LocalStore;
pub use s3::S3Store;

use crate::rollup::PipelineOutput;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::io::Write;
use tracing::info;

pub const OUTPUT_KEY: &str = "awt_data/rolling_average.json";
pub const SUMMARY_KEY: &str = "awt_data/rolling_average_summary.json";

const JSON: &str = "application/json";
const GZIP: &str = "application/gzip";

#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn put_bytes(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<()>;
}

/// Serializes `value` as indented JSON and stores it under `key`.
pub async fn write_json<S: ResultStore + ?Sized>(
    store: &S,
    key: &str,
    value: &impl Serialize,
) -> Result<()> {
    let body = serde_json::to_vec_pretty(value)?;
    store.put_bytes(key, body, JSON).await
}

/// Writes the averaged document and its run summary.
#[tracing::instrument(skip_all)]
pub async fn publish<S: ResultStore + ?Sized>(store: &S, output: &PipelineOutput) -> Result<()> {
    write_json(store, OUTPUT_KEY, &output.result).await?;
    write_json(store, SUMMARY_KEY, &output.summary).await?;
    info!(
        key = OUTPUT_KEY,
        total_points = output.result.metadata.total_points,
        "Published rolling averages"
    );
    Ok(())
}

/// Key for a raw API snapshot taken at `at`.
pub fn raw_archive_key(at: DateTime<Utc>, gzip: bool) -> String {
    let key = format!(
        "awt_data/raw/awt_tracking_data_{}.json",
        at.format("%Y%m%d_%H%M%S")
    );
    if gzip { format!("{key}.gz") } else { key }
}

/// Stores the raw payload exactly as fetched, optionally gzip-compressed.
pub async fn archive_raw<S: ResultStore + ?Sized>(
    store: &S,
    raw: &[u8],
    at: DateTime<Utc>,
    gzip: bool,
) -> Result<String> {
    let key = raw_archive_key(at, gzip);
    let (body, content_type) = if gzip {
        (gzip_bytes(raw)?, GZIP)
    } else {
        (raw.to_vec(), JSON)
    };

    store.put_bytes(&key, body, content_type).await?;
    info!(key = %key, bytes = raw.len(), gzip, "Archived raw tracking data");
    Ok(key)
}

pub fn gzip_bytes(raw: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(raw)?;
    Ok(encoder.finish()?)
}
