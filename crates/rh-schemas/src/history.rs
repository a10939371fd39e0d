use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::product::{Product, ProductPatch};

/// One step of a changeset.
///
/// `Add` overwrites by id; `Remove` and `Update` against an id that is not in
/// the current state are no-ops, never errors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Operation {
    Add { rate: Product },
    Remove { id: String },
    Update { id: String, changes: ProductPatch },
}

impl Operation {
    pub fn product_id(&self) -> &str {
        match self {
            Operation::Add { rate } => &rate.id,
            Operation::Remove { id } => id,
            Operation::Update { id, .. } => id,
        }
    }
}

/// Full known catalogue at the earliest tracked instant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Baseline {
    pub timestamp: DateTime<Utc>,
    /// Opaque integrity marker from the write path. Never inspected here.
    #[serde(default)]
    pub rates_hash: String,
    pub rates: Vec<Product>,
}

/// Timestamped batch of operations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Changeset {
    pub timestamp: DateTime<Utc>,
    /// Opaque integrity marker from the write path. Never inspected here.
    #[serde(default)]
    pub after_hash: String,
    pub operations: Vec<Operation>,
}

impl Changeset {
    pub fn new(timestamp: DateTime<Utc>, operations: Vec<Operation>) -> Self {
        Self {
            timestamp,
            after_hash: String::new(),
            operations,
        }
    }
}

/// Per-lender history: baseline plus changesets.
///
/// Changesets are sorted by timestamp (stable, ascending) on every
/// construction path, including deserialization. Consumers may rely on
/// chronological order without re-sorting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "HistoryDocument")]
pub struct HistoryLog {
    pub lender_id: String,
    pub baseline: Baseline,
    changesets: Vec<Changeset>,
}

/// Raw document shape before the ordering invariant is established.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryDocument {
    lender_id: String,
    baseline: Baseline,
    #[serde(default)]
    changesets: Vec<Changeset>,
}

impl From<HistoryDocument> for HistoryLog {
    fn from(doc: HistoryDocument) -> Self {
        HistoryLog::new(doc.lender_id, doc.baseline, doc.changesets)
    }
}

impl HistoryLog {
    pub fn new(
        lender_id: impl Into<String>,
        baseline: Baseline,
        mut changesets: Vec<Changeset>,
    ) -> Self {
        // Stable: same-timestamp changesets keep their document order.
        changesets.sort_by_key(|cs| cs.timestamp);
        Self {
            lender_id: lender_id.into(),
            baseline,
            changesets,
        }
    }

    pub fn changesets(&self) -> &[Changeset] {
        &self.changesets
    }

    pub fn baseline_timestamp(&self) -> DateTime<Utc> {
        self.baseline.timestamp
    }

    /// Timestamp of the newest recorded state (baseline if no changesets).
    pub fn latest_timestamp(&self) -> DateTime<Utc> {
        self.changesets
            .last()
            .map(|cs| cs.timestamp)
            .unwrap_or(self.baseline.timestamp)
            .max(self.baseline.timestamp)
    }

    pub fn is_chronological(&self) -> bool {
        self.changesets
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp)
    }
}
