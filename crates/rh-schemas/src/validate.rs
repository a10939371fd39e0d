//! Structural validation of a decoded history document.
//!
//! Serde already enforces the shape. This layer rejects documents whose
//! shape is fine but whose content breaks the invariants the engine relies
//! on. A rejected document is dropped by the store; the engine never sees it.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::{HistoryLog, Operation, Product};

#[derive(Clone, Debug, PartialEq)]
pub enum ValidationError {
    EmptyLenderId,
    EmptyProductId {
        at: DateTime<Utc>,
    },
    DuplicateBaselineProduct {
        id: String,
    },
    ChangesetBeforeBaseline {
        changeset: DateTime<Utc>,
        baseline: DateTime<Utc>,
    },
    UpdateIdMismatch {
        id: String,
        changes_id: String,
    },
    NonFiniteNumber {
        id: String,
        field: &'static str,
    },
    InvertedLtv {
        id: String,
        min_ltv: f64,
        max_ltv: f64,
    },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyLenderId => write!(f, "history document: lenderId must not be empty"),
            Self::EmptyProductId { at } => {
                write!(f, "history document: empty product id at {at}")
            }
            Self::DuplicateBaselineProduct { id } => {
                write!(f, "history document: duplicate baseline product id={id}")
            }
            Self::ChangesetBeforeBaseline {
                changeset,
                baseline,
            } => write!(
                f,
                "history document: changeset {changeset} precedes baseline {baseline}"
            ),
            Self::UpdateIdMismatch { id, changes_id } => write!(
                f,
                "history document: update id={id} carries changes.id={changes_id}"
            ),
            Self::NonFiniteNumber { id, field } => {
                write!(f, "history document: product id={id} has non-finite {field}")
            }
            Self::InvertedLtv {
                id,
                min_ltv,
                max_ltv,
            } => write!(
                f,
                "history document: product id={id} minLtv {min_ltv} > maxLtv {max_ltv}"
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a decoded document. Returns the first violation found.
pub fn validate_document(log: &HistoryLog) -> Result<(), ValidationError> {
    if log.lender_id.trim().is_empty() {
        return Err(ValidationError::EmptyLenderId);
    }

    let baseline_ts = log.baseline.timestamp;
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for p in &log.baseline.rates {
        validate_product(p, baseline_ts)?;
        if !seen.insert(p.id.as_str()) {
            return Err(ValidationError::DuplicateBaselineProduct { id: p.id.clone() });
        }
    }

    for cs in log.changesets() {
        if cs.timestamp < baseline_ts {
            return Err(ValidationError::ChangesetBeforeBaseline {
                changeset: cs.timestamp,
                baseline: baseline_ts,
            });
        }
        for op in &cs.operations {
            if op.product_id().trim().is_empty() {
                return Err(ValidationError::EmptyProductId { at: cs.timestamp });
            }
            match op {
                Operation::Add { rate } => validate_product(rate, cs.timestamp)?,
                Operation::Remove { .. } => {}
                Operation::Update { id, changes } => {
                    if changes.id != *id {
                        return Err(ValidationError::UpdateIdMismatch {
                            id: id.clone(),
                            changes_id: changes.id.clone(),
                        });
                    }
                    check_finite(id, "rate", changes.rate)?;
                    check_finite(id, "apr", changes.apr)?;
                }
            }
        }
    }

    Ok(())
}

fn validate_product(p: &Product, at: DateTime<Utc>) -> Result<(), ValidationError> {
    if p.id.trim().is_empty() {
        return Err(ValidationError::EmptyProductId { at });
    }
    check_finite(&p.id, "rate", Some(p.rate))?;
    check_finite(&p.id, "apr", p.apr)?;
    if p.min_ltv > p.max_ltv {
        return Err(ValidationError::InvertedLtv {
            id: p.id.clone(),
            min_ltv: p.min_ltv,
            max_ltv: p.max_ltv,
        });
    }
    Ok(())
}

fn check_finite(id: &str, field: &'static str, v: Option<f64>) -> Result<(), ValidationError> {
    match v {
        Some(x) if !x.is_finite() => Err(ValidationError::NonFiniteNumber {
            id: id.to_string(),
            field,
        }),
        _ => Ok(()),
    }
}
