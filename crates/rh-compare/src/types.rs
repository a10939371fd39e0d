use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use rh_history::FieldChange;
use rh_schemas::{rate_type_key, Product};
use serde::{Deserialize, Serialize};

/// Classification of one product between the two snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonStatus {
    Unchanged,
    Increased,
    Decreased,
    New,
    Removed,
    Modified,
}

impl ComparisonStatus {
    pub const ALL: [ComparisonStatus; 6] = [
        ComparisonStatus::Decreased,
        ComparisonStatus::Modified,
        ComparisonStatus::Unchanged,
        ComparisonStatus::Increased,
        ComparisonStatus::New,
        ComparisonStatus::Removed,
    ];

    /// Display priority. Lower sorts first.
    pub fn priority(&self) -> u8 {
        match self {
            ComparisonStatus::Decreased => 0,
            ComparisonStatus::Modified => 1,
            ComparisonStatus::Unchanged => 2,
            ComparisonStatus::Increased => 3,
            ComparisonStatus::New => 4,
            ComparisonStatus::Removed => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonStatus::Unchanged => "unchanged",
            ComparisonStatus::Increased => "increased",
            ComparisonStatus::Decreased => "decreased",
            ComparisonStatus::New => "new",
            ComparisonStatus::Removed => "removed",
            ComparisonStatus::Modified => "modified",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|st| st.as_str() == s)
    }
}

/// One row of the comparison.
///
/// `product` is the end-date version when the product still exists, the
/// start-date version when it was removed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonEntry {
    pub lender_id: String,
    pub product: Product,
    pub previous_rate: Option<f64>,
    pub current_rate: Option<f64>,
    pub change_amount: Option<f64>,
    pub change_percent: Option<f64>,
    pub status: ComparisonStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_changes: Option<Vec<FieldChange>>,
}

/// Buyer category filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuyerCategory {
    /// Primary dwelling house.
    Pdh,
    /// Buy to let.
    Btl,
}

impl BuyerCategory {
    pub fn allowed_buyer_types(&self) -> &'static [&'static str] {
        match self {
            BuyerCategory::Pdh => &["ftb", "mover", "switcher-pdh"],
            BuyerCategory::Btl => &["btl", "switcher-btl"],
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdh" => Some(BuyerCategory::Pdh),
            "btl" => Some(BuyerCategory::Btl),
            _ => None,
        }
    }

    pub fn accepts(&self, product: &Product) -> bool {
        let allowed = self.allowed_buyer_types();
        product
            .buyer_types
            .iter()
            .any(|bt| allowed.contains(&bt.as_str()))
    }
}

/// Filters applied independently to both snapshots before matching.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompareFilters {
    /// Empty means every lender.
    pub lender_ids: BTreeSet<String>,
    /// Derived key: `variable` or `fixed-{term}`.
    pub rate_type: Option<String>,
    pub buyer_category: Option<BuyerCategory>,
}

impl CompareFilters {
    pub fn accepts_lender(&self, lender_id: &str) -> bool {
        self.lender_ids.is_empty() || self.lender_ids.contains(lender_id)
    }

    pub fn accepts(&self, product: &Product) -> bool {
        if let Some(key) = &self.rate_type {
            if rate_type_key(product) != *key {
                return false;
            }
        }
        if let Some(category) = &self.buyer_category {
            if !category.accepts(product) {
                return false;
            }
        }
        true
    }
}

/// Where the end snapshot comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum EndPoint {
    /// Reconstruct every lender at this instant.
    At(DateTime<Utc>),
    /// Current catalogue per lender, used as-is. Missing lender = no products.
    Live(BTreeMap<String, Vec<Product>>),
}
