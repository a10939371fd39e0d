//! `rh compare`: catalogue diff between two dates.

use std::collections::BTreeSet;

use anyhow::Result;
use chrono::Utc;
use rh_compare::{
    compare, BuyerCategory, CompareFilters, ComparisonStatus, ComparisonSummary, DisplayFilter,
    EndPoint,
};
use serde_json::json;

use super::{parse_when, print_json, Session};

pub struct CompareArgs {
    pub from: String,
    pub to: Option<String>,
    pub lenders: Vec<String>,
    pub rate_type: Option<String>,
    pub buyer: Option<String>,
    pub search: Option<String>,
    pub statuses: Vec<String>,
    pub summary: bool,
}

fn parse_buyer(raw: &str) -> Result<BuyerCategory> {
    match BuyerCategory::parse(raw) {
        Some(c) => Ok(c),
        None => anyhow::bail!("invalid buyer category '{raw}'. expected one of: pdh | btl"),
    }
}

fn parse_statuses(raw: &[String]) -> Result<BTreeSet<ComparisonStatus>> {
    let mut out = BTreeSet::new();
    for s in raw {
        match ComparisonStatus::parse(s) {
            Some(st) => {
                out.insert(st);
            }
            None => anyhow::bail!(
                "invalid --status '{s}'. expected one of: decreased | modified | unchanged | increased | new | removed"
            ),
        }
    }
    Ok(out)
}

/// Execute `rh compare`.
///
/// Flags override the config `compare` defaults. Without `--to` the end
/// snapshot is every lender's state now.
pub async fn run(session: &Session, args: CompareArgs) -> Result<()> {
    let start = parse_when(&args.from)?;
    let end = match args.to.as_deref() {
        Some(raw) => parse_when(raw)?,
        None => Utc::now(),
    };
    if start > end {
        anyhow::bail!("--from {start} is after --to {end}");
    }

    let defaults = &session.tracker.compare;
    let buyer_category = args
        .buyer
        .as_deref()
        .or(defaults.buyer_category.as_deref())
        .map(parse_buyer)
        .transpose()?;
    let rate_type = args
        .rate_type
        .clone()
        .or_else(|| defaults.rate_type.clone())
        .map(|k| k.trim().to_ascii_lowercase());

    let filters = CompareFilters {
        lender_ids: args.lenders.iter().cloned().collect(),
        rate_type,
        buyer_category,
    };
    let display = DisplayFilter {
        search: args.search.clone(),
        statuses: parse_statuses(&args.statuses)?,
    };

    let logs = session.load_many(&args.lenders).await?;
    let entries = compare(&logs, start, &EndPoint::At(end), &filters);
    let entries = display.apply(entries, &session.tracker.lender_names());

    tracing::info!(
        lenders = logs.len(),
        entries = entries.len(),
        %start,
        %end,
        "comparison built"
    );

    if args.summary {
        print_json(&json!({
            "from": start,
            "to": end,
            "summary": ComparisonSummary::from_entries(&entries),
            "entries": entries,
        }))
    } else {
        print_json(&entries)
    }
}
