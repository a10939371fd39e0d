use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use rh_history::{change_percent, diff_products, reconstruct, Snapshot};
use rh_schemas::{HistoryLog, Product};

use crate::{CompareFilters, ComparisonEntry, ComparisonStatus, EndPoint};

fn removed(lender_id: &str, before: &Product) -> ComparisonEntry {
    ComparisonEntry {
        lender_id: lender_id.to_string(),
        product: before.clone(),
        previous_rate: Some(before.rate),
        current_rate: None,
        change_amount: None,
        change_percent: None,
        status: ComparisonStatus::Removed,
        field_changes: None,
    }
}

fn added(lender_id: &str, after: &Product) -> ComparisonEntry {
    ComparisonEntry {
        lender_id: lender_id.to_string(),
        product: after.clone(),
        previous_rate: None,
        current_rate: Some(after.rate),
        change_amount: None,
        change_percent: None,
        status: ComparisonStatus::New,
        field_changes: None,
    }
}

fn matched(lender_id: &str, before: &Product, after: &Product) -> ComparisonEntry {
    let diffs = diff_products(before, after);
    let amount = if after.rate != before.rate {
        after.rate - before.rate
    } else {
        0.0
    };

    let status = if after.rate > before.rate {
        ComparisonStatus::Increased
    } else if after.rate < before.rate {
        ComparisonStatus::Decreased
    } else if !diffs.is_empty() {
        ComparisonStatus::Modified
    } else {
        ComparisonStatus::Unchanged
    };

    ComparisonEntry {
        lender_id: lender_id.to_string(),
        product: after.clone(),
        previous_rate: Some(before.rate),
        current_rate: Some(after.rate),
        change_amount: Some(amount),
        change_percent: change_percent(before.rate, amount),
        status,
        field_changes: (!diffs.is_empty()).then_some(diffs),
    }
}

fn compare_lender(
    lender_id: &str,
    tracked_before_start: bool,
    start: &Snapshot,
    end: &Snapshot,
    filters: &CompareFilters,
    out: &mut Vec<ComparisonEntry>,
) {
    let mut seen: BTreeSet<&str> = BTreeSet::new();

    // 1) Everything visible at start: removed or matched.
    for (id, before) in start {
        if !filters.accepts(before) {
            continue;
        }
        seen.insert(id.as_str());
        match end.get(id).filter(|after| filters.accepts(after)) {
            None => out.push(removed(lender_id, before)),
            Some(after) => out.push(matched(lender_id, before, after)),
        }
    }

    // 2) Visible only at end. Novelty is only claimable when the lender was
    //    already tracked at the start date.
    if !tracked_before_start {
        return;
    }
    for (id, after) in end {
        if seen.contains(id.as_str()) || !filters.accepts(after) {
            continue;
        }
        out.push(added(lender_id, after));
    }
}

fn end_snapshot(lender_id: &str, log: &HistoryLog, end: &EndPoint) -> Snapshot {
    match end {
        EndPoint::At(t) => reconstruct(log, *t),
        EndPoint::Live(catalogue) => catalogue
            .get(lender_id)
            .map(|products| {
                products
                    .iter()
                    .map(|p| (p.id.clone(), p.clone()))
                    .collect()
            })
            .unwrap_or_default(),
    }
}

/// Sort by status priority, then change amount ascending (missing = 0),
/// then lender id and product id.
pub fn sort_entries(entries: &mut [ComparisonEntry]) {
    entries.sort_by(|a, b| {
        a.status
            .priority()
            .cmp(&b.status.priority())
            .then_with(|| {
                a.change_amount
                    .unwrap_or(0.0)
                    .total_cmp(&b.change_amount.unwrap_or(0.0))
            })
            .then_with(|| a.lender_id.cmp(&b.lender_id))
            .then_with(|| a.product.id.cmp(&b.product.id))
    });
}

/// Compare every in-scope lender between `start` and `end`.
///
/// `logs` is keyed by lender id. A lender without a log is simply absent
/// from the output.
pub fn compare(
    logs: &BTreeMap<String, HistoryLog>,
    start: DateTime<Utc>,
    end: &EndPoint,
    filters: &CompareFilters,
) -> Vec<ComparisonEntry> {
    let mut out: Vec<ComparisonEntry> = Vec::new();

    for (lender_id, log) in logs {
        if !filters.accepts_lender(lender_id) {
            continue;
        }
        let start_snap = reconstruct(log, start);
        let end_snap = end_snapshot(lender_id, log, end);
        compare_lender(
            lender_id,
            log.baseline.timestamp <= start,
            &start_snap,
            &end_snap,
            filters,
            &mut out,
        );
    }

    sort_entries(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rh_history::Field;
    use rh_schemas::ProductPatch;
    use rh_testkit::{add, product, remove, ts, update, update_rate, LogBuilder};

    fn logs(items: Vec<HistoryLog>) -> BTreeMap<String, HistoryLog> {
        items
            .into_iter()
            .map(|l| (l.lender_id.clone(), l))
            .collect()
    }

    fn statuses(entries: &[ComparisonEntry]) -> Vec<(String, ComparisonStatus)> {
        entries
            .iter()
            .map(|e| (e.product.id.clone(), e.status))
            .collect()
    }

    #[test]
    fn classifies_every_status() {
        let log = LogBuilder::new("aib", "2024-06-01")
            .baseline_product(product("down", "aib", 4.0))
            .baseline_product(product("up", "aib", 3.0))
            .baseline_product(product("same", "aib", 3.5))
            .baseline_product(product("tweak", "aib", 3.6))
            .baseline_product(product("gone", "aib", 3.7))
            .changeset(
                "2024-07-01",
                vec![
                    update_rate("down", 3.8),
                    update_rate("up", 3.2),
                    update(ProductPatch {
                        perks: Some(vec!["cashback".into()]),
                        ..ProductPatch::new("tweak")
                    }),
                    remove("gone"),
                    add(product("fresh", "aib", 3.9)),
                ],
            )
            .build();

        let out = compare(
            &logs(vec![log]),
            ts("2024-06-15"),
            &EndPoint::At(ts("2024-12-01")),
            &CompareFilters::default(),
        );

        assert_eq!(
            statuses(&out),
            vec![
                ("down".to_string(), ComparisonStatus::Decreased),
                ("tweak".to_string(), ComparisonStatus::Modified),
                ("same".to_string(), ComparisonStatus::Unchanged),
                ("up".to_string(), ComparisonStatus::Increased),
                ("fresh".to_string(), ComparisonStatus::New),
                ("gone".to_string(), ComparisonStatus::Removed),
            ]
        );

        let tweak = &out[1];
        assert_eq!(tweak.change_amount, Some(0.0));
        let fields: Vec<Field> = tweak
            .field_changes
            .as_ref()
            .unwrap()
            .iter()
            .map(|c| c.field)
            .collect();
        assert_eq!(fields, vec![Field::Perks]);
        assert!(out[2].field_changes.is_none());
    }

    #[test]
    fn rate_move_also_attaches_field_diffs() {
        let log = LogBuilder::new("aib", "2024-06-01")
            .baseline_product(product("p", "aib", 4.0))
            .changeset(
                "2024-07-01",
                vec![update(ProductPatch::new("p").with_rate(3.5).with_name("Renamed"))],
            )
            .build();
        let out = compare(
            &logs(vec![log]),
            ts("2024-06-01"),
            &EndPoint::At(ts("2024-08-01")),
            &CompareFilters::default(),
        );
        assert_eq!(out[0].status, ComparisonStatus::Decreased);
        assert_eq!(out[0].product.name, "Renamed");
        let fc = out[0].field_changes.as_ref().unwrap();
        assert_eq!(fc.len(), 1);
        assert_eq!(fc[0].field, Field::Name);
    }

    #[test]
    fn new_requires_history_before_start() {
        let log = LogBuilder::new("aib", "2024-08-01")
            .baseline_product(product("late", "aib", 3.5))
            .build();
        let out = compare(
            &logs(vec![log]),
            ts("2024-06-01"),
            &EndPoint::At(ts("2024-12-01")),
            &CompareFilters::default(),
        );
        assert!(out.is_empty());
    }

    #[test]
    fn filtered_out_at_end_counts_as_removed() {
        let log = LogBuilder::new("aib", "2024-06-01")
            .baseline_product(product("p", "aib", 3.5))
            .changeset(
                "2024-07-01",
                vec![update(ProductPatch {
                    buyer_types: Some(vec!["btl".into()]),
                    ..ProductPatch::new("p")
                })],
            )
            .build();
        let filters = CompareFilters {
            buyer_category: Some(crate::BuyerCategory::Pdh),
            ..CompareFilters::default()
        };
        let out = compare(
            &logs(vec![log]),
            ts("2024-06-01"),
            &EndPoint::At(ts("2024-08-01")),
            &filters,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].status, ComparisonStatus::Removed);
        assert_eq!(out[0].current_rate, None);
    }

    #[test]
    fn sort_treats_missing_amount_as_zero() {
        let mut entries = vec![
            ComparisonEntry {
                change_amount: None,
                ..removed("aib", &product("b", "aib", 1.0))
            },
            ComparisonEntry {
                status: ComparisonStatus::Removed,
                change_amount: Some(-0.5),
                ..removed("aib", &product("a", "aib", 1.0))
            },
        ];
        sort_entries(&mut entries);
        assert_eq!(entries[0].product.id, "a");
    }
}
