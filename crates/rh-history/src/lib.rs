//! rh-history
//!
//! Point-in-time reconstruction and change extraction over a per-lender
//! `HistoryLog` (baseline + changesets):
//! - `reconstruct`: full product snapshot at an instant
//! - `time_series`: (timestamp, rate, apr) observations for one product
//! - `changes`: flat, timestamped added / removed / changed events
//! - `diff_fields`: field-level structural diff shared with rh-compare
//!
//! Pure deterministic logic. No IO, no clock, no shared state. The input log
//! is never mutated; every query returns freshly allocated values.

mod changes;
mod diff;
mod reconstruct;
mod series;
mod types;

pub use changes::{change_percent, changes, merged_changes};
pub use diff::{diff_fields, diff_products, Field, FieldChange, AUDITED_FIELDS, COMPARED_FIELDS};
pub use reconstruct::{apply_operation, reconstruct, reconstruct_products, Snapshot};
pub use series::{all_time_series, time_series};
pub use types::{ChangeEntry, ChangeType, ChangeWindow, DataPoint, TimeSeries};
