//! Raw document sources.

use std::io;
use std::path::PathBuf;

use crate::StoreError;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Pluggable origin of history documents.
///
/// Object-safe so callers can pick a source at runtime and hold an
/// `Arc<dyn HistorySource>`.
#[async_trait::async_trait]
pub trait HistorySource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Raw JSON text of the lender's history document.
    async fn fetch_document(&self, lender_id: &str) -> Result<String, StoreError>;
}

/// Lender ids become path segments; anything that could escape the
/// directory or the URL path is treated as unknown.
fn is_safe_lender_id(lender_id: &str) -> bool {
    !lender_id.is_empty()
        && lender_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

// ---------------------------------------------------------------------------
// Directory source
// ---------------------------------------------------------------------------

/// Reads `<dir>/<lenderId>.json`.
#[derive(Debug, Clone)]
pub struct FsHistorySource {
    dir: PathBuf,
}

impl FsHistorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, lender_id: &str) -> PathBuf {
        self.dir.join(format!("{lender_id}.json"))
    }
}

#[async_trait::async_trait]
impl HistorySource for FsHistorySource {
    fn name(&self) -> &'static str {
        "fs"
    }

    async fn fetch_document(&self, lender_id: &str) -> Result<String, StoreError> {
        if !is_safe_lender_id(lender_id) {
            return Err(StoreError::NotFound {
                lender_id: lender_id.to_string(),
            });
        }
        let path = self.path_for(lender_id);
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => Ok(raw),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::NotFound {
                lender_id: lender_id.to_string(),
            }),
            Err(e) => Err(StoreError::Transport(format!(
                "read {} failed: {e}",
                path.display()
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP source
// ---------------------------------------------------------------------------

/// `GET {base_url}/{lenderId}.json`
#[derive(Debug, Clone)]
pub struct HttpHistorySource {
    http: reqwest::Client,
    base_url: String,
}

impl HttpHistorySource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn build_url(&self, lender_id: &str) -> String {
        format!("{}/{lender_id}.json", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl HistorySource for HttpHistorySource {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch_document(&self, lender_id: &str) -> Result<String, StoreError> {
        if !is_safe_lender_id(lender_id) {
            return Err(StoreError::NotFound {
                lender_id: lender_id.to_string(),
            });
        }
        let url = self.build_url(lender_id);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| StoreError::Transport(format!("GET {url} failed: {e}")))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound {
                lender_id: lender_id.to_string(),
            });
        }
        if !status.is_success() {
            return Err(StoreError::Transport(format!(
                "GET {url} status={}",
                status.as_u16()
            )));
        }

        resp.text()
            .await
            .map_err(|e| StoreError::Transport(format!("GET {url} body read failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lender_ids_are_plain_segments() {
        assert!(is_safe_lender_id("aib"));
        assert!(is_safe_lender_id("credit-union_2"));
        assert!(!is_safe_lender_id(""));
        assert!(!is_safe_lender_id("../etc/passwd"));
        assert!(!is_safe_lender_id("a/b"));
    }

    #[test]
    fn http_url_ignores_trailing_slash() {
        let a = HttpHistorySource::new("http://host/history/");
        let b = HttpHistorySource::new("http://host/history");
        assert_eq!(a.build_url("aib"), "http://host/history/aib.json");
        assert_eq!(b.build_url("aib"), "http://host/history/aib.json");
    }

    #[tokio::test]
    async fn fs_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let src = FsHistorySource::new(dir.path());
        match src.fetch_document("aib").await {
            Err(StoreError::NotFound { lender_id }) => assert_eq!(lender_id, "aib"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}
