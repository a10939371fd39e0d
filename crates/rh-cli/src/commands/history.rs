//! `rh snapshot`, `rh series` and `rh changes`.

use anyhow::Result;
use rh_history::{all_time_series, merged_changes, reconstruct_products, time_series, ChangeWindow};
use serde_json::json;

use super::{parse_when, print_json, Session};

/// Execute `rh snapshot`: the lender's catalogue as of `at`.
pub async fn snapshot(session: &Session, lender_id: &str, at: &str) -> Result<()> {
    let at = parse_when(at)?;
    let log = session.load_one(lender_id).await?;
    let products = reconstruct_products(&log, at);

    tracing::info!(lender_id, %at, products = products.len(), "snapshot reconstructed");
    print_json(&json!({
        "lenderId": lender_id,
        "at": at,
        "products": products,
    }))
}

/// Execute `rh series`.
pub async fn series(session: &Session, lender_id: &str, product_id: Option<&str>) -> Result<()> {
    let log = session.load_one(lender_id).await?;
    match product_id {
        Some(id) => {
            let Some(series) = time_series(&log, id) else {
                anyhow::bail!("product '{id}' never appears in history for lender={lender_id}");
            };
            print_json(&series)
        }
        None => print_json(&all_time_series(&log)),
    }
}

/// Execute `rh changes`: merged change log, newest first.
pub async fn changes(
    session: &Session,
    lenders: &[String],
    from: Option<&str>,
    to: Option<&str>,
) -> Result<()> {
    let window = ChangeWindow {
        start: from.map(parse_when).transpose()?,
        end: to.map(parse_when).transpose()?,
    };
    if let (Some(start), Some(end)) = (window.start, window.end) {
        if start > end {
            anyhow::bail!("--from {start} is after --to {end}");
        }
    }

    let logs = session.load_many(lenders).await?;
    let entries = merged_changes(logs.values(), window);
    tracing::info!(lenders = logs.len(), entries = entries.len(), "change log built");
    print_json(&entries)
}
