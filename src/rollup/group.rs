//! Hemisphere filter and per-animal grouping.

use crate::rollup::types::{EntityId, RawFix};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Fixes for one animal. Order is whatever the input had; the aggregator sorts.
pub type Timeline = Vec<RawFix>;

/// Diagnostic counts from one grouping pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupReport {
    pub total: usize,
    pub discarded: usize,
    pub entities: usize,
}

impl GroupReport {
    pub fn valid(&self) -> usize {
        self.total - self.discarded
    }
}

/// Output of [`group`]: one timeline per animal plus diagnostics.
#[derive(Debug, Default)]
pub struct Grouped {
    pub timelines: BTreeMap<EntityId, Timeline>,
    pub report: GroupReport,
}

/// The study area lies entirely south of the equator, so any fix with a
/// non-negative latitude is corrupt telemetry. NaN latitudes fail too.
pub fn is_valid_fix(fix: &RawFix) -> bool {
    fix.latitude < 0.0
}

/// Keeps valid fixes in input order and returns how many were dropped.
pub fn filter_valid(fixes: Vec<RawFix>) -> (Vec<RawFix>, usize) {
    let total = fixes.len();
    let kept: Vec<RawFix> = fixes.into_iter().filter(is_valid_fix).collect();
    let discarded = total - kept.len();
    (kept, discarded)
}

/// Filters out invalid fixes and partitions the rest by entity id.
///
/// Empty input yields an empty mapping.
pub fn group(fixes: Vec<RawFix>) -> Grouped {
    let total = fixes.len();
    let (valid, discarded) = filter_valid(fixes);

    let mut timelines: BTreeMap<EntityId, Timeline> = BTreeMap::new();
    for fix in valid {
        timelines.entry(fix.entity_id.clone()).or_default().push(fix);
    }

    let report = GroupReport {
        total,
        discarded,
        entities: timelines.len(),
    };

    if discarded > 0 {
        debug!(discarded, "Dropped fixes with non-negative latitude");
    }
    info!(
        total = report.total,
        discarded = report.discarded,
        entities = report.entities,
        "Grouped fixes by animal"
    );

    Grouped { timelines, report }
}
