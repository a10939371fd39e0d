//! Caller-side presentation helpers layered over `compare` output.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{ComparisonEntry, ComparisonStatus};

/// Free-text search plus a status toggle set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisplayFilter {
    /// Case-insensitive substring over product name and lender display name.
    pub search: Option<String>,
    /// Empty means every status.
    pub statuses: BTreeSet<ComparisonStatus>,
}

impl DisplayFilter {
    /// `lender_names` maps lender id to display name; unknown ids fall back
    /// to the id itself.
    pub fn matches(
        &self,
        entry: &ComparisonEntry,
        lender_names: &BTreeMap<String, String>,
    ) -> bool {
        if !self.statuses.is_empty() && !self.statuses.contains(&entry.status) {
            return false;
        }

        let needle = match self.search.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s.to_lowercase(),
            _ => return true,
        };
        let lender = lender_names
            .get(&entry.lender_id)
            .map(String::as_str)
            .unwrap_or(entry.lender_id.as_str());

        entry.product.name.to_lowercase().contains(&needle)
            || lender.to_lowercase().contains(&needle)
    }

    pub fn apply(
        &self,
        entries: Vec<ComparisonEntry>,
        lender_names: &BTreeMap<String, String>,
    ) -> Vec<ComparisonEntry> {
        entries
            .into_iter()
            .filter(|e| self.matches(e, lender_names))
            .collect()
    }
}

/// Per-status counts over a comparison result.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSummary {
    pub total: usize,
    pub unchanged: usize,
    pub increased: usize,
    pub decreased: usize,
    pub modified: usize,
    pub new: usize,
    pub removed: usize,
}

impl ComparisonSummary {
    pub fn from_entries(entries: &[ComparisonEntry]) -> Self {
        let mut s = Self::default();
        for e in entries {
            s.total += 1;
            match e.status {
                ComparisonStatus::Unchanged => s.unchanged += 1,
                ComparisonStatus::Increased => s.increased += 1,
                ComparisonStatus::Decreased => s.decreased += 1,
                ComparisonStatus::Modified => s.modified += 1,
                ComparisonStatus::New => s.new += 1,
                ComparisonStatus::Removed => s.removed += 1,
            }
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rh_testkit::product;

    fn entry(lender: &str, name: &str, status: ComparisonStatus) -> ComparisonEntry {
        let mut p = product("id", lender, 3.5);
        p.name = name.to_string();
        ComparisonEntry {
            lender_id: lender.to_string(),
            product: p,
            previous_rate: Some(3.5),
            current_rate: Some(3.5),
            change_amount: Some(0.0),
            change_percent: Some(0.0),
            status,
            field_changes: None,
        }
    }

    fn names() -> BTreeMap<String, String> {
        BTreeMap::from([("boi".to_string(), "Bank of Ireland".to_string())])
    }

    #[test]
    fn search_hits_product_or_lender_display_name() {
        let f = DisplayFilter {
            search: Some("IRELAND".into()),
            ..DisplayFilter::default()
        };
        assert!(f.matches(&entry("boi", "4 Year Fixed", ComparisonStatus::Unchanged), &names()));
        assert!(!f.matches(&entry("aib", "4 Year Fixed", ComparisonStatus::Unchanged), &names()));

        let f = DisplayFilter {
            search: Some("green".into()),
            ..DisplayFilter::default()
        };
        assert!(f.matches(&entry("aib", "Green 3 Year", ComparisonStatus::Unchanged), &names()));
        // unknown lender falls back to its id
        let f = DisplayFilter {
            search: Some("ai".into()),
            ..DisplayFilter::default()
        };
        assert!(f.matches(&entry("aib", "x", ComparisonStatus::Unchanged), &names()));
    }

    #[test]
    fn status_toggle_and_blank_search() {
        let f = DisplayFilter {
            search: Some("   ".into()),
            statuses: BTreeSet::from([ComparisonStatus::New, ComparisonStatus::Removed]),
        };
        let kept = f.apply(
            vec![
                entry("aib", "a", ComparisonStatus::New),
                entry("aib", "b", ComparisonStatus::Unchanged),
                entry("aib", "c", ComparisonStatus::Removed),
            ],
            &names(),
        );
        let kept: Vec<&str> = kept.iter().map(|e| e.product.name.as_str()).collect();
        assert_eq!(kept, vec!["a", "c"]);
    }

    #[test]
    fn summary_counts() {
        let s = ComparisonSummary::from_entries(&[
            entry("aib", "a", ComparisonStatus::New),
            entry("aib", "b", ComparisonStatus::New),
            entry("aib", "c", ComparisonStatus::Decreased),
        ]);
        assert_eq!(s.total, 3);
        assert_eq!(s.new, 2);
        assert_eq!(s.decreased, 1);
        assert_eq!(s.removed, 0);
    }
}
