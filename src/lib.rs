//! Privacy-preserving rolling averages over raw wildlife GPS fixes.
//!
//! Raw fixes are fetched from the tracking API ([`fetch`]), decoded
//! ([`parser`]), reduced to one averaged position per sliding window of fixes
//! per animal ([`rollup`]), and persisted as JSON ([`store`]).

pub mod config;
pub mod error;
pub mod fetch;
pub mod parser;
pub mod rollup;
pub mod store;

pub use error::{RollupError, RollupResult};
