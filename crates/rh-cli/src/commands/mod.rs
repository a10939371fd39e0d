//! Command handler modules for the `rh` binary.
//!
//! Shared utilities (date parsing, source resolution, JSON output) live
//! here. Command-specific logic lives in the submodules.

pub mod compare;
pub mod history;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::Args;
use rh_config::{SourceConfig, TrackerConfig};
use rh_schemas::HistoryLog;
use rh_store::{FsHistorySource, HistorySource, HistoryStore, HttpHistorySource};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Global flags
// ---------------------------------------------------------------------------

#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Layered config paths in merge order
    #[arg(long = "config", global = true)]
    pub config_paths: Vec<String>,

    /// Directory holding `<lender>.json` history documents
    #[arg(long, env = "RH_HISTORY_DIR", global = true)]
    pub history_dir: Option<PathBuf>,

    /// Base URL serving `<lender>.json` history documents
    #[arg(long, env = "RH_HISTORY_URL", global = true)]
    pub history_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Parse an RFC 3339 instant or a bare `YYYY-MM-DD` (start of day UTC).
pub fn parse_when(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    let day = NaiveDate::parse_from_str(raw, "%Y-%m-%d").with_context(|| {
        format!("invalid date '{raw}'. expected RFC 3339 or YYYY-MM-DD")
    })?;
    let midnight = day
        .and_hms_opt(0, 0, 0)
        .with_context(|| format!("invalid date '{raw}'"))?;
    Ok(midnight.and_utc())
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("serialize output json failed")?;
    println!("{out}");
    Ok(())
}

/// Every `<id>.json` directly inside `dir`, sorted.
fn discover_lenders(dir: &Path) -> Result<Vec<String>> {
    let mut ids: Vec<String> = Vec::new();
    let entries =
        fs::read_dir(dir).with_context(|| format!("read history dir failed: {}", dir.display()))?;
    for entry in entries {
        let path = entry.context("read history dir entry failed")?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            ids.push(stem.to_string());
        }
    }
    ids.sort();
    Ok(ids)
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Resolved configuration plus a history store for one invocation.
pub struct Session {
    pub tracker: TrackerConfig,
    pub store: HistoryStore<dyn HistorySource>,
    fs_dir: Option<PathBuf>,
}

impl Session {
    /// Flags win over the config `source`.
    pub fn open(args: &SourceArgs) -> Result<Self> {
        let tracker = if args.config_paths.is_empty() {
            TrackerConfig::default()
        } else {
            let path_refs: Vec<&str> = args.config_paths.iter().map(|s| s.as_str()).collect();
            let loaded = rh_config::load_layered_yaml(&path_refs)?;
            tracing::info!(config_hash = %loaded.config_hash, "config loaded");
            loaded.tracker()?
        };

        let source_cfg = if let Some(dir) = &args.history_dir {
            SourceConfig::Fs {
                dir: dir.to_string_lossy().to_string(),
            }
        } else if let Some(url) = &args.history_url {
            SourceConfig::Http {
                base_url: url.clone(),
            }
        } else {
            tracker.source.clone().context(
                "no history source: pass --history-dir, --history-url or a config with `source`",
            )?
        };

        let (source, fs_dir): (Arc<dyn HistorySource>, Option<PathBuf>) = match source_cfg {
            SourceConfig::Fs { dir } => {
                let dir = PathBuf::from(dir);
                (Arc::new(FsHistorySource::new(dir.clone())), Some(dir))
            }
            SourceConfig::Http { base_url } => (Arc::new(HttpHistorySource::new(base_url)), None),
        };
        tracing::debug!(source = source.name(), "history source ready");

        Ok(Self {
            tracker,
            store: HistoryStore::new(source),
            fs_dir,
        })
    }

    /// Explicit ids, else configured lenders, else every document in the
    /// history directory.
    pub fn lender_ids(&self, explicit: &[String]) -> Result<Vec<String>> {
        if !explicit.is_empty() {
            return Ok(explicit.to_vec());
        }
        if !self.tracker.lenders.is_empty() {
            return Ok(self.tracker.lender_ids());
        }
        match &self.fs_dir {
            Some(dir) => discover_lenders(dir),
            None => anyhow::bail!("no lenders configured: pass --lender or list `lenders` in config"),
        }
    }

    /// One lender; a load failure is an error for single-lender commands.
    pub async fn load_one(&self, lender_id: &str) -> Result<Arc<HistoryLog>> {
        self.store
            .get_or_fetch(lender_id)
            .await
            .with_context(|| format!("load history failed for lender={lender_id}"))
    }

    /// Every resolvable lender. Unavailable lenders are skipped (and logged by
    /// the store).
    pub async fn load_many(&self, explicit: &[String]) -> Result<BTreeMap<String, HistoryLog>> {
        let ids = self.lender_ids(explicit)?;
        let logs = self.store.get_many(ids).await;
        Ok(logs
            .into_iter()
            .map(|(id, log)| (id, HistoryLog::clone(&log)))
            .collect())
    }
}
