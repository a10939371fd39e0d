use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::diff::FieldChange;

/// One observation of a product's pricing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPoint {
    pub timestamp: DateTime<Utc>,
    pub rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apr: Option<f64>,
}

/// Rate/APR history of a single product, oldest first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeries {
    pub product_id: String,
    /// Last known name (renames update it without adding a data point).
    pub product_name: String,
    pub lender_id: String,
    pub data_points: Vec<DataPoint>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Removed,
    Changed,
}

/// One product-level event in the change log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEntry {
    pub lender_id: String,
    pub product_id: String,
    pub product_name: String,
    pub timestamp: DateTime<Utc>,
    pub previous_rate: Option<f64>,
    pub new_rate: Option<f64>,
    pub change_type: ChangeType,
    pub change_amount: Option<f64>,
    /// `None` when the previous rate is zero (percentage undefined).
    pub change_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_changes: Option<Vec<FieldChange>>,
}

/// Inclusive time window; `None` on either side means unbounded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChangeWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl ChangeWindow {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn until(end: DateTime<Utc>) -> Self {
        Self {
            start: None,
            end: Some(end),
        }
    }

    pub fn since(start: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    pub fn is_before_start(&self, t: DateTime<Utc>) -> bool {
        self.start.is_some_and(|s| t < s)
    }

    pub fn is_after_end(&self, t: DateTime<Utc>) -> bool {
        self.end.is_some_and(|e| t > e)
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        !self.is_before_start(t) && !self.is_after_end(t)
    }
}
