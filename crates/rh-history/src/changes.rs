//! Change log extraction.
//!
//! # Window semantics
//!
//! - Baseline inside the window: one `added` entry per baseline product.
//! - Changesets before `start`: replayed silently so entries at the window
//!   boundary see the correct previous state.
//! - Changesets inside the window: replayed and emitted.
//! - Changesets after `end`: not processed at all.
//!
//! `Remove` / `Update` of an untracked id emit nothing, mirroring
//! reconstruction's no-op rule, so replaying the emitted entries from an
//! unbounded start reproduces `reconstruct` at the window end.

use chrono::{DateTime, Utc};
use rh_schemas::{HistoryLog, Operation, Product};

use crate::diff::{diff_fields, AUDITED_FIELDS};
use crate::reconstruct::baseline_state;
use crate::types::{ChangeEntry, ChangeType, ChangeWindow};

/// Percentage move relative to `previous`.
///
/// `None` when `previous` is zero: the percentage is undefined and callers
/// display it as missing rather than infinite.
pub fn change_percent(previous: f64, amount: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    Some(amount / previous * 100.0)
}

fn added_entry(lender_id: &str, p: &Product, at: DateTime<Utc>) -> ChangeEntry {
    ChangeEntry {
        lender_id: lender_id.to_string(),
        product_id: p.id.clone(),
        product_name: p.name.clone(),
        timestamp: at,
        previous_rate: None,
        new_rate: Some(p.rate),
        change_type: ChangeType::Added,
        change_amount: None,
        change_percent: None,
        field_changes: None,
    }
}

fn removed_entry(lender_id: &str, p: &Product, at: DateTime<Utc>) -> ChangeEntry {
    ChangeEntry {
        lender_id: lender_id.to_string(),
        product_id: p.id.clone(),
        product_name: p.name.clone(),
        timestamp: at,
        previous_rate: Some(p.rate),
        new_rate: None,
        change_type: ChangeType::Removed,
        change_amount: None,
        change_percent: None,
        field_changes: None,
    }
}

/// `None` when nothing compared differs.
fn changed_entry(
    lender_id: &str,
    prev: &Product,
    next: &Product,
    at: DateTime<Utc>,
) -> Option<ChangeEntry> {
    let field_changes = diff_fields(prev, next, AUDITED_FIELDS);
    if field_changes.is_empty() {
        return None;
    }

    let amount = if prev.rate != next.rate {
        next.rate - prev.rate
    } else {
        0.0
    };

    Some(ChangeEntry {
        lender_id: lender_id.to_string(),
        product_id: next.id.clone(),
        product_name: next.name.clone(),
        timestamp: at,
        previous_rate: Some(prev.rate),
        new_rate: Some(next.rate),
        change_type: ChangeType::Changed,
        change_amount: Some(amount),
        change_percent: change_percent(prev.rate, amount),
        field_changes: Some(field_changes),
    })
}

/// Flat change log for one lender within `window`, in replay order.
pub fn changes(log: &HistoryLog, window: ChangeWindow) -> Vec<ChangeEntry> {
    let lender_id = log.lender_id.as_str();
    let mut out: Vec<ChangeEntry> = Vec::new();
    let mut state = baseline_state(log);

    if window.contains(log.baseline.timestamp) {
        for p in &log.baseline.rates {
            out.push(added_entry(lender_id, p, log.baseline.timestamp));
        }
    }

    for cs in log.changesets() {
        if window.is_after_end(cs.timestamp) {
            break;
        }
        let emit = !window.is_before_start(cs.timestamp);

        for op in &cs.operations {
            match op {
                Operation::Add { rate } => {
                    if emit {
                        out.push(added_entry(lender_id, rate, cs.timestamp));
                    }
                    state.insert(rate.id.clone(), rate.clone());
                }
                Operation::Remove { id } => {
                    if let Some(prev) = state.remove(id) {
                        if emit {
                            out.push(removed_entry(lender_id, &prev, cs.timestamp));
                        }
                    }
                }
                Operation::Update { id, changes } => {
                    let Some(prev) = state.get(id) else {
                        continue;
                    };
                    let next = changes.applied(prev);
                    if emit {
                        if let Some(entry) = changed_entry(lender_id, prev, &next, cs.timestamp) {
                            out.push(entry);
                        }
                    }
                    state.insert(id.clone(), next);
                }
            }
        }
    }

    out
}

/// Change logs for several lenders merged newest first.
///
/// Ties break on lender id, then product id, so output is deterministic.
pub fn merged_changes<'a, I>(logs: I, window: ChangeWindow) -> Vec<ChangeEntry>
where
    I: IntoIterator<Item = &'a HistoryLog>,
{
    let mut out: Vec<ChangeEntry> = logs
        .into_iter()
        .flat_map(|log| changes(log, window))
        .collect();
    out.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| a.lender_id.cmp(&b.lender_id))
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    out
}
