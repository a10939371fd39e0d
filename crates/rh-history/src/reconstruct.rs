//! Point-in-time reconstruction.
//!
//! State at `t` = baseline products, then every changeset with
//! `timestamp <= t` replayed in chronological order. Replay stops at the
//! first changeset past `t`; `HistoryLog` guarantees changesets are sorted.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rh_schemas::{HistoryLog, Operation, Product};

/// Reconstructed state at one instant, keyed by product id.
///
/// Iteration order is by id. Consumers that need another order sort
/// themselves.
pub type Snapshot = BTreeMap<String, Product>;

/// Apply a single operation to a working snapshot.
///
/// `Remove` / `Update` for an id not present are no-ops.
pub fn apply_operation(state: &mut Snapshot, op: &Operation) {
    match op {
        Operation::Add { rate } => {
            state.insert(rate.id.clone(), rate.clone());
        }
        Operation::Remove { id } => {
            state.remove(id);
        }
        Operation::Update { id, changes } => {
            if let Some(existing) = state.get_mut(id) {
                changes.apply_to(existing);
            }
        }
    }
}

pub(crate) fn baseline_state(log: &HistoryLog) -> Snapshot {
    log.baseline
        .rates
        .iter()
        .map(|p| (p.id.clone(), p.clone()))
        .collect()
}

/// Products that existed at `target`.
///
/// Empty when `target` precedes the baseline (no data yet, not an error).
pub fn reconstruct(log: &HistoryLog, target: DateTime<Utc>) -> Snapshot {
    if target < log.baseline.timestamp {
        return Snapshot::new();
    }

    let mut state = baseline_state(log);
    for cs in log.changesets() {
        if cs.timestamp > target {
            break;
        }
        for op in &cs.operations {
            apply_operation(&mut state, op);
        }
    }
    state
}

/// [`reconstruct`] flattened to a list (ordered by id).
pub fn reconstruct_products(log: &HistoryLog, target: DateTime<Utc>) -> Vec<Product> {
    reconstruct(log, target).into_values().collect()
}
