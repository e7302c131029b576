//! Data types used by the rolling-average pipeline.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a tracked animal, as issued by the tracking API.
///
/// Collars are keyed by integers on some deployments and by strings on
/// others; both forms are kept verbatim so the output echoes the input.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Int(i64),
    Text(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Int(id) => write!(f, "{id}"),
            EntityId::Text(id) => f.write_str(id),
        }
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        EntityId::Text(id.to_string())
    }
}

/// One GPS observation for a tracked animal.
///
/// Passthrough telemetry (temperature, voltage, ...) is dropped at decode time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFix {
    pub entity_id: EntityId,
    /// Event time of the fix.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
}

/// Calendar span (UTC) covered by the first and last fix of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// One smoothed position, anchored at the last fix of its window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AveragedFix {
    pub entity_id: EntityId,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub days_used: usize,
    pub original_points: usize,
    pub date_range: DateRange,
}

/// Header of the published document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub generated_at: DateTime<Utc>,
    pub rolling_window_days: usize,
    pub total_animals: usize,
    pub total_points: usize,
    pub privacy_note: String,
}

/// Complete output of one run, serialized as `{ "metadata": .., "data": .. }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
    pub metadata: Metadata,
    pub data: Vec<AveragedFix>,
}

/// Counts and reduction ratio reported alongside the published document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub total_original_points: usize,
    pub valid_points: usize,
    pub discarded_points: usize,
    pub total_averaged_points: usize,
    pub total_animals: usize,
    pub reduction_percent: f64,
}
