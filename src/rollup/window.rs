//! Sliding-window averaging over one animal's fixes.
//!
//! A window is `window_size` consecutive *fixes*, not calendar days. With
//! irregular collar cadence the `dateRange` of a window can cover more or
//! fewer days than the window size.

use crate::rollup::group::Timeline;
use crate::rollup::types::{AveragedFix, DateRange, RawFix};
use crate::rollup::utility::{mean, round_to};

/// Output coordinates are rounded to this many decimal places.
pub const COORDINATE_DECIMALS: i32 = 6;

/// Produces one [`AveragedFix`] per full window, stride 1.
///
/// The timeline is sorted by timestamp first (stable, so equal timestamps
/// keep their input order). Fewer than `window_size` fixes yields nothing;
/// otherwise the result has `len - window_size + 1` entries.
pub fn aggregate(mut timeline: Timeline, window_size: usize) -> Vec<AveragedFix> {
    if window_size == 0 || timeline.len() < window_size {
        return Vec::new();
    }

    timeline.sort_by_key(|fix| fix.timestamp);

    timeline.windows(window_size).map(average_window).collect()
}

fn average_window(window: &[RawFix]) -> AveragedFix {
    let first = &window[0];
    let last = &window[window.len() - 1];

    let latitudes: Vec<f64> = window.iter().map(|f| f.latitude).collect();
    let longitudes: Vec<f64> = window.iter().map(|f| f.longitude).collect();

    AveragedFix {
        entity_id: last.entity_id.clone(),
        timestamp: last.timestamp,
        latitude: round_to(mean(&latitudes), COORDINATE_DECIMALS),
        longitude: round_to(mean(&longitudes), COORDINATE_DECIMALS),
        days_used: window.len(),
        original_points: window.len(),
        date_range: DateRange {
            start: first.timestamp.date_naive(),
            end: last.timestamp.date_naive(),
        },
    }
}
