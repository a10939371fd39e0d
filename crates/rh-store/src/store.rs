use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use rh_schemas::{validate_document, HistoryLog};
use tokio::sync::{OnceCell, RwLock};
use tokio::task::JoinSet;

use crate::{HistorySource, StoreError};

type Slot = Arc<OnceCell<Arc<HistoryLog>>>;

/// Decode a raw history document and check its structure.
pub fn parse_history(raw: &str) -> Result<HistoryLog, StoreError> {
    let log: HistoryLog =
        serde_json::from_str(raw).map_err(|e| StoreError::Decode(e.to_string()))?;
    validate_document(&log)?;
    Ok(log)
}

/// Per-lender cache of validated history logs.
///
/// Each lender owns one `OnceCell`. Concurrent callers for the same lender
/// await the same initialisation. A failed fetch leaves the cell empty so
/// the next call retries.
pub struct HistoryStore<S: HistorySource + ?Sized> {
    source: Arc<S>,
    cache: Arc<RwLock<HashMap<String, Slot>>>,
}

impl<S: HistorySource + ?Sized> Clone for HistoryStore<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<S: HistorySource + ?Sized + 'static> HistoryStore<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    async fn slot(&self, lender_id: &str) -> Slot {
        if let Some(slot) = self.cache.read().await.get(lender_id) {
            return Arc::clone(slot);
        }
        let mut cache = self.cache.write().await;
        Arc::clone(
            cache
                .entry(lender_id.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new())),
        )
    }

    async fn load(&self, lender_id: &str) -> Result<Arc<HistoryLog>, StoreError> {
        tracing::debug!(lender_id, source = self.source.name(), "fetching history");
        let raw = self.source.fetch_document(lender_id).await?;
        let log = parse_history(&raw)?;
        if log.lender_id != lender_id {
            return Err(StoreError::LenderMismatch {
                requested: lender_id.to_string(),
                found: log.lender_id,
            });
        }
        tracing::info!(
            lender_id,
            changesets = log.changesets().len(),
            baseline_products = log.baseline.rates.len(),
            "history loaded"
        );
        Ok(Arc::new(log))
    }

    /// Cached log for `lender_id`, fetching it on first use.
    pub async fn get_or_fetch(&self, lender_id: &str) -> Result<Arc<HistoryLog>, StoreError> {
        let slot = self.slot(lender_id).await;
        if let Some(log) = slot.get() {
            tracing::trace!(lender_id, "history cache hit");
            return Ok(Arc::clone(log));
        }
        slot.get_or_try_init(|| self.load(lender_id))
            .await
            .map(Arc::clone)
    }

    /// Logs for every requested lender that could be loaded.
    ///
    /// Lenders that fail are logged and left out of the map.
    pub async fn get_many<I, L>(&self, lender_ids: I) -> BTreeMap<String, Arc<HistoryLog>>
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        let mut tasks: JoinSet<(String, Result<Arc<HistoryLog>, StoreError>)> = JoinSet::new();
        for lender_id in lender_ids {
            let lender_id: String = lender_id.into();
            let store = self.clone();
            tasks.spawn(async move {
                let res = store.get_or_fetch(&lender_id).await;
                (lender_id, res)
            });
        }

        let mut out: BTreeMap<String, Arc<HistoryLog>> = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((lender_id, Ok(log))) => {
                    out.insert(lender_id, log);
                }
                Ok((lender_id, Err(e))) => {
                    tracing::warn!(lender_id = %lender_id, error = %e, "history unavailable; lender skipped");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "history fetch task failed");
                }
            }
        }
        out
    }

    /// Drop the cached log so the next access refetches.
    pub async fn invalidate(&self, lender_id: &str) -> bool {
        self.cache.write().await.remove(lender_id).is_some()
    }

    /// Lenders with a successfully loaded log, sorted.
    pub async fn cached_lenders(&self) -> Vec<String> {
        let cache = self.cache.read().await;
        let mut ids: Vec<String> = cache
            .iter()
            .filter(|(_, slot)| slot.initialized())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rh_testkit::{product, rate_cut_log, update_rate, LogBuilder};

    /// In-memory source that counts fetches.
    struct CountingSource {
        docs: HashMap<String, String>,
        calls: AtomicUsize,
    }

    impl CountingSource {
        fn with(docs: &[(&str, String)]) -> Self {
            Self {
                docs: docs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl HistorySource for CountingSource {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn fetch_document(&self, lender_id: &str) -> Result<String, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.docs
                .get(lender_id)
                .cloned()
                .ok_or_else(|| StoreError::NotFound {
                    lender_id: lender_id.to_string(),
                })
        }
    }

    fn doc() -> String {
        serde_json::to_string(&rate_cut_log()).unwrap()
    }

    #[test]
    fn parse_rejects_garbage_and_invalid_documents() {
        assert!(matches!(parse_history("not json"), Err(StoreError::Decode(_))));

        let mut log = rate_cut_log();
        log.lender_id = String::new();
        let raw = serde_json::to_string(&log).unwrap();
        assert!(matches!(parse_history(&raw), Err(StoreError::Invalid(_))));
    }

    #[test]
    fn parse_sorts_unordered_changesets() {
        let log = LogBuilder::new("aib", "2024-06-01")
            .baseline_product(product("rate-1", "aib", 3.5))
            .changeset("2024-07-01", vec![update_rate("rate-1", 3.4)])
            .changeset("2024-08-01", vec![update_rate("rate-1", 3.3)])
            .build();
        let mut v = serde_json::to_value(&log).unwrap();
        v["changesets"].as_array_mut().unwrap().reverse();
        let parsed = parse_history(&v.to_string()).unwrap();
        assert!(parsed.is_chronological());
        assert_eq!(parsed, log);
    }

    #[tokio::test]
    async fn second_get_is_served_from_cache() {
        let src = Arc::new(CountingSource::with(&[("aib", doc())]));
        let store = HistoryStore::new(Arc::clone(&src));

        let a = store.get_or_fetch("aib").await.unwrap();
        let b = store.get_or_fetch("aib").await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(src.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.cached_lenders().await, vec!["aib".to_string()]);
    }

    #[tokio::test]
    async fn failures_are_retried() {
        let src = Arc::new(CountingSource::with(&[]));
        let store = HistoryStore::new(Arc::clone(&src));

        assert!(store.get_or_fetch("boi").await.is_err());
        assert!(store.get_or_fetch("boi").await.is_err());
        assert_eq!(src.calls.load(Ordering::SeqCst), 2);
        assert!(store.cached_lenders().await.is_empty());
    }

    #[tokio::test]
    async fn mismatched_lender_is_rejected() {
        let src = Arc::new(CountingSource::with(&[("boi", doc())]));
        let store = HistoryStore::new(src);
        match store.get_or_fetch("boi").await {
            Err(StoreError::LenderMismatch { requested, found }) => {
                assert_eq!(requested, "boi");
                assert_eq!(found, "aib");
            }
            other => panic!("expected LenderMismatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let src = Arc::new(CountingSource::with(&[("aib", doc())]));
        let store = HistoryStore::new(Arc::clone(&src));

        store.get_or_fetch("aib").await.unwrap();
        assert!(store.invalidate("aib").await);
        assert!(!store.invalidate("aib").await);
        store.get_or_fetch("aib").await.unwrap();
        assert_eq!(src.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn get_many_omits_failures() {
        let src = Arc::new(CountingSource::with(&[("aib", doc())]));
        let store = HistoryStore::new(src);
        let logs = store.get_many(["aib", "missing"]).await;
        assert_eq!(logs.keys().cloned().collect::<Vec<_>>(), vec!["aib"]);
    }
}
