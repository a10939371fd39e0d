//! rh-compare
//!
//! Snapshot comparison: "what changed between two dates" across lenders.
//!
//! - Start snapshot is always reconstructed; end is either reconstructed at a
//!   past instant or taken from the live catalogue
//! - Products match by id within a lender
//! - Status: unchanged / increased / decreased / modified / new / removed
//! - Output sorted by status priority, then change amount ascending
//!
//! Deterministic, pure logic. No IO.

mod display;
mod engine;
mod types;

pub use display::{ComparisonSummary, DisplayFilter};
pub use engine::{compare, sort_entries};
pub use types::*;
