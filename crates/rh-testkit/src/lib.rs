//! rh-testkit
//!
//! Fixture builders shared by the workspace's tests: timestamps from short
//! date strings, products, operations, a `HistoryLog` builder, and a helper
//! that writes logs into a temporary history directory.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rh_schemas::{Baseline, Changeset, HistoryLog, Operation, Product, ProductPatch, RateType};
use std::fs;
use tempfile::TempDir;

/// Parse `YYYY-MM-DD` (midnight UTC) or a full RFC 3339 timestamp.
///
/// Panics on malformed input; fixtures are literals.
pub fn ts(s: &str) -> DateTime<Utc> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).unwrap().and_utc();
    }
    DateTime::parse_from_rfc3339(s)
        .unwrap_or_else(|e| panic!("bad fixture timestamp {s}: {e}"))
        .with_timezone(&Utc)
}

/// Variable-rate product open to PDH buyers.
pub fn product(id: &str, lender: &str, rate: f64) -> Product {
    Product {
        buyer_types: vec!["ftb".to_string(), "mover".to_string()],
        ..Product::new(id, format!("{id} name"), lender, rate)
    }
}

pub fn fixed_product(id: &str, lender: &str, term: u32, rate: f64) -> Product {
    Product {
        rate_type: RateType::Fixed,
        fixed_term: Some(term),
        ..product(id, lender, rate)
    }
}

pub fn add(p: Product) -> Operation {
    Operation::Add { rate: p }
}

pub fn remove(id: &str) -> Operation {
    Operation::Remove { id: id.to_string() }
}

pub fn update(patch: ProductPatch) -> Operation {
    Operation::Update {
        id: patch.id.clone(),
        changes: patch,
    }
}

pub fn update_rate(id: &str, rate: f64) -> Operation {
    update(ProductPatch::new(id).with_rate(rate))
}

/// Incremental `HistoryLog` builder. Changesets are kept in call order so
/// tests can feed out-of-order input to `HistoryLog::new`.
#[derive(Clone, Debug)]
pub struct LogBuilder {
    lender_id: String,
    baseline_ts: DateTime<Utc>,
    rates: Vec<Product>,
    changesets: Vec<Changeset>,
}

impl LogBuilder {
    pub fn new(lender_id: &str, baseline_ts: &str) -> Self {
        Self {
            lender_id: lender_id.to_string(),
            baseline_ts: ts(baseline_ts),
            rates: Vec::new(),
            changesets: Vec::new(),
        }
    }

    pub fn baseline_product(mut self, p: Product) -> Self {
        self.rates.push(p);
        self
    }

    pub fn changeset(mut self, at: &str, operations: Vec<Operation>) -> Self {
        self.changesets.push(Changeset::new(ts(at), operations));
        self
    }

    pub fn raw_changesets(&self) -> Vec<Changeset> {
        self.changesets.clone()
    }

    pub fn build(self) -> HistoryLog {
        HistoryLog::new(
            self.lender_id,
            Baseline {
                timestamp: self.baseline_ts,
                rates_hash: String::new(),
                rates: self.rates,
            },
            self.changesets,
        )
    }
}

/// Baseline `{rate-1: 3.5%}` at 2024-06-01, rate cut to 3.25 on 2024-07-01.
pub fn rate_cut_log() -> HistoryLog {
    LogBuilder::new("aib", "2024-06-01")
        .baseline_product(product("rate-1", "aib", 3.5))
        .changeset("2024-07-01", vec![update_rate("rate-1", 3.25)])
        .build()
}

/// Baseline `{rate-1: 3.5%}` at 2024-06-01, removed on 2024-09-01.
pub fn removal_log() -> HistoryLog {
    LogBuilder::new("aib", "2024-06-01")
        .baseline_product(product("rate-1", "aib", 3.5))
        .changeset("2024-09-01", vec![remove("rate-1")])
        .build()
}

/// Write each log as `<dir>/<lenderId>.json`.
pub fn write_history_dir(logs: &[HistoryLog]) -> Result<TempDir> {
    let dir = tempfile::tempdir().context("create temp history dir")?;
    for log in logs {
        let path = dir.path().join(format!("{}.json", log.lender_id));
        let body = serde_json::to_string_pretty(log).context("serialize history log")?;
        fs::write(&path, body).with_context(|| format!("write {}", path.display()))?;
    }
    Ok(dir)
}
