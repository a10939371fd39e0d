//! Scenario: per-product time series across a product's lifecycle
//!
//! # Invariants under test
//!
//! 1. `time_series` is `None` iff the id never appears in the baseline or in
//!    any `Add`.
//! 2. Points are chronological even when changesets were supplied out of
//!    order.
//! 3. Remove-then-add stitches into one series; updates in between are
//!    silent.

use rh_history::time_series;
use rh_schemas::HistoryLog;
use rh_testkit::{add, product, remove, ts, update_rate, LogBuilder};

fn lifecycle() -> LogBuilder {
    LogBuilder::new("aib", "2024-06-01")
        .baseline_product(product("rate-1", "aib", 3.5))
        .changeset("2024-09-01", vec![remove("rate-1")])
        .changeset("2024-07-01", vec![update_rate("rate-1", 3.25)])
        .changeset("2024-08-01", vec![add(product("rate-2", "aib", 4.0))])
        .changeset("2024-10-01", vec![update_rate("rate-1", 3.0), update_rate("ghost", 1.0)])
        .changeset("2024-11-01", vec![add(product("rate-1", "aib", 3.4))])
        .changeset("2024-12-01", vec![update_rate("rate-1", 3.3)])
}

#[test]
fn series_exists_iff_observed() {
    let log = lifecycle().build();
    assert!(time_series(&log, "rate-1").is_some());
    assert!(time_series(&log, "rate-2").is_some());
    assert!(time_series(&log, "ghost").is_none());
    assert!(time_series(&log, "never-mentioned").is_none());
}

#[test]
fn points_are_chronological_and_stitched() {
    let log = lifecycle().build();
    let s = time_series(&log, "rate-1").unwrap();
    let got: Vec<(String, f64)> = s
        .data_points
        .iter()
        .map(|p| (p.timestamp.format("%Y-%m-%d").to_string(), p.rate))
        .collect();
    assert_eq!(
        got,
        vec![
            ("2024-06-01".to_string(), 3.5),
            ("2024-07-01".to_string(), 3.25),
            ("2024-11-01".to_string(), 3.4),
            ("2024-12-01".to_string(), 3.3),
        ]
    );
    assert!(s.data_points.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[test]
fn added_product_starts_at_add_time() {
    let log = lifecycle().build();
    let s = time_series(&log, "rate-2").unwrap();
    assert_eq!(s.data_points.len(), 1);
    assert_eq!(s.data_points[0].timestamp, ts("2024-08-01"));
}

#[test]
fn series_is_independent_of_input_order() {
    let builder = lifecycle();
    let a = builder.clone().build();
    let mut reversed = builder.raw_changesets();
    reversed.reverse();
    let b = HistoryLog::new("aib", a.baseline.clone(), reversed);
    assert_eq!(time_series(&a, "rate-1"), time_series(&b, "rate-1"));
}
