//! Scenario: comparing against the live catalogue
//!
//! # Invariants under test
//!
//! 1. With `EndPoint::Live`, the end set is the supplied catalogue, not a
//!    reconstruction.
//! 2. A lender missing from the live catalogue has every start product
//!    reported as removed.
//! 3. Rate-type filter applies to both sides: a product whose term changed
//!    out of the filter is removed, one that moved into it is new.

use std::collections::BTreeMap;

use rh_compare::{compare, CompareFilters, ComparisonStatus, ComparisonSummary, EndPoint};
use rh_schemas::HistoryLog;
use rh_testkit::{fixed_product, product, LogBuilder};

fn history() -> BTreeMap<String, HistoryLog> {
    let aib = LogBuilder::new("aib", "2024-06-01")
        .baseline_product(fixed_product("f", "aib", 3, 3.9))
        .baseline_product(fixed_product("g", "aib", 5, 3.7))
        .baseline_product(product("v", "aib", 4.2))
        .build();
    let ptsb = LogBuilder::new("ptsb", "2024-06-01")
        .baseline_product(product("p1", "ptsb", 4.5))
        .build();
    BTreeMap::from([("aib".to_string(), aib), ("ptsb".to_string(), ptsb)])
}

#[test]
fn live_catalogue_replaces_reconstruction() {
    let live = BTreeMap::from([(
        "aib".to_string(),
        vec![
            fixed_product("f", "aib", 3, 3.75),
            fixed_product("g", "aib", 5, 3.7),
            product("v", "aib", 4.3),
        ],
    )]);

    let out = compare(
        &history(),
        rh_testkit::ts("2024-07-01"),
        &EndPoint::Live(live),
        &CompareFilters::default(),
    );
    let summary = ComparisonSummary::from_entries(&out);
    assert_eq!(summary.decreased, 1);
    assert_eq!(summary.unchanged, 1);
    assert_eq!(summary.increased, 1);
    assert_eq!(summary.removed, 1, "ptsb missing from live catalogue");
    assert_eq!(summary.total, 4);
    assert_eq!(out.last().map(|e| e.lender_id.as_str()), Some("ptsb"));
}

#[test]
fn rate_type_filter_applies_to_both_sides() {
    let live = BTreeMap::from([(
        "aib".to_string(),
        vec![
            fixed_product("f", "aib", 4, 3.9),
            fixed_product("g", "aib", 3, 3.7),
        ],
    )]);
    let filters = CompareFilters {
        rate_type: Some("fixed-3".to_string()),
        ..CompareFilters::default()
    };
    let out = compare(
        &history(),
        rh_testkit::ts("2024-07-01"),
        &EndPoint::Live(live),
        &filters,
    );
    let rows: Vec<(&str, ComparisonStatus)> = out
        .iter()
        .map(|e| (e.product.id.as_str(), e.status))
        .collect();
    assert_eq!(
        rows,
        vec![("g", ComparisonStatus::New), ("f", ComparisonStatus::Removed)]
    );
}
