//! Rolling-average reduction of raw GPS fixes.
//!
//! [`group`] drops implausible fixes and splits the rest per animal,
//! [`window`] averages each animal's fixes over a sliding window, and
//! [`assemble`] merges everything into one time-ordered document.
//! [`pipeline::run`] chains the three.

pub mod assemble;
pub mod group;
pub mod pipeline;
pub mod types;
pub mod utility;
pub mod window;

pub use pipeline::{PipelineOutput, run};
pub use types::{AggregationResult, AveragedFix, DateRange, EntityId, Metadata, RawFix, RunSummary};
