use std::collections::BTreeSet;

use rh_schemas::{HistoryLog, Operation};

use crate::types::{DataPoint, TimeSeries};

/// Rate/APR observations for `product_id` across the whole log.
///
/// - baseline presence seeds one point at the baseline timestamp
/// - `Add` always pushes a point (a re-add after removal continues the
///   same series)
/// - `Remove` pushes nothing
/// - `Update` always folds rate, apr and name into the tracked values,
///   even while removed; it pushes a point only while the product exists
///   and only when rate or apr numerically changed
///
/// `None` when the product was never observed.
pub fn time_series(log: &HistoryLog, product_id: &str) -> Option<TimeSeries> {
    let mut points: Vec<DataPoint> = Vec::new();
    let mut name: Option<String> = None;
    let mut lender_id: Option<String> = None;
    let mut current_rate: Option<f64> = None;
    let mut current_apr: Option<f64> = None;
    let mut exists = false;

    if let Some(p) = log.baseline.rates.iter().find(|p| p.id == product_id) {
        points.push(DataPoint {
            timestamp: log.baseline.timestamp,
            rate: p.rate,
            apr: p.apr,
        });
        name = Some(p.name.clone());
        lender_id = Some(p.lender_id.clone());
        current_rate = Some(p.rate);
        current_apr = p.apr;
        exists = true;
    }

    for cs in log.changesets() {
        for op in cs.operations.iter().filter(|op| op.product_id() == product_id) {
            match op {
                Operation::Add { rate: p } => {
                    name = Some(p.name.clone());
                    lender_id = Some(p.lender_id.clone());
                    current_rate = Some(p.rate);
                    current_apr = p.apr;
                    exists = true;
                    points.push(DataPoint {
                        timestamp: cs.timestamp,
                        rate: p.rate,
                        apr: p.apr,
                    });
                }
                Operation::Remove { .. } => {
                    exists = false;
                }
                Operation::Update { changes, .. } => {
                    let prev_rate = current_rate;
                    let prev_apr = current_apr;
                    if let Some(r) = changes.rate {
                        current_rate = Some(r);
                    }
                    if let Some(a) = changes.apr {
                        current_apr = Some(a);
                    }
                    if let Some(n) = &changes.name {
                        name = Some(n.clone());
                    }

                    let moved = current_rate != prev_rate || current_apr != prev_apr;
                    if let (true, true, Some(rate)) = (exists, moved, current_rate) {
                        points.push(DataPoint {
                            timestamp: cs.timestamp,
                            rate,
                            apr: current_apr,
                        });
                    }
                }
            }
        }
    }

    if points.is_empty() {
        return None;
    }

    Some(TimeSeries {
        product_id: product_id.to_string(),
        product_name: name.unwrap_or_else(|| product_id.to_string()),
        lender_id: lender_id.unwrap_or_else(|| log.lender_id.clone()),
        data_points: points,
    })
}

/// One series per product id ever observed in the log, ordered by id.
pub fn all_time_series(log: &HistoryLog) -> Vec<TimeSeries> {
    let mut ids: BTreeSet<&str> = log.baseline.rates.iter().map(|p| p.id.as_str()).collect();
    for cs in log.changesets() {
        for op in &cs.operations {
            if let Operation::Add { rate } = op {
                ids.insert(rate.id.as_str());
            }
        }
    }
    ids.into_iter()
        .filter_map(|id| time_series(log, id))
        .collect()
}
