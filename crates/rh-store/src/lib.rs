//! rh-store
//!
//! Fetches and caches per-lender history documents.
//!
//! - `HistorySource`: where raw documents come from (directory or HTTP)
//! - `parse_history`: decode + structural validation
//! - `HistoryStore`: per-lender cache; one in-flight fetch per lender,
//!   failures are never cached
//!
//! The engine crates never see a `StoreError`: `HistoryStore::get_many`
//! drops lenders whose document could not be loaded.

mod error;
mod source;
mod store;

pub use error::StoreError;
pub use source::{FsHistorySource, HistorySource, HttpHistorySource};
pub use store::{parse_history, HistoryStore};
