//! rh-schemas
//!
//! Data model for per-lender mortgage rate history:
//! - `Product`: one rate offering as published by a lender
//! - `ProductPatch`: sparse update, every field behind an explicit `Option`
//! - `Operation`: tagged add / remove / update
//! - `HistoryLog`: baseline + chronologically sorted changesets
//!
//! Serde names follow the published history document (`camelCase`,
//! `op`-tagged operations). Pure data; no IO.

mod history;
mod product;
mod validate;

pub use history::{Baseline, Changeset, HistoryLog, Operation};
pub use product::{rate_type_key, Product, ProductPatch, RateType};
pub use validate::{validate_document, ValidationError};
