use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

use crate::{
    bundle::BundleSet,
    error::{CertError, CertResult},
};

/// Minimal client for a key/value HTTP store with raw reads (`?raw`) and `PUT` writes.
#[derive(Debug, Clone)]
pub struct KvClient {
    client: Client,
    timeout: Duration,
}

impl KvClient {
    pub fn new(timeout: Duration) -> CertResult<Self> {
        let client = Client::builder().connect_timeout(timeout).build()?;
        Ok(Self { client, timeout })
    }

    /// Raw value under `url`, or `None` if the key does not exist.
    pub async fn get(&self, url: &str) -> CertResult<Option<String>> {
        let response = self
            .client
            .get(format!("{url}?raw"))
            .timeout(self.timeout)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => Ok(Some(response.text().await?)),
            s => Err(CertError::UnexpectedStatus {
                url: url.to_string(),
                status: s.as_u16(),
            }),
        }
    }

    pub async fn put(&self, url: &str, value: &str) -> CertResult<()> {
        let response = self
            .client
            .put(url)
            .timeout(self.timeout)
            .body(value.to_string())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CertError::UnexpectedStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}

/// Counters of one [`sync_bundles`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub checked: usize,
    pub updated: usize,
    pub failed: usize,
}

/// Write every bundle whose stored value differs under `<base>/<name>.pem`.
///
/// A failing key is logged and counted; the remaining keys are still processed.
pub async fn sync_bundles(kv: &KvClient, base: &str, bundles: &BundleSet) -> SyncReport {
    let base = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{base}/")
    };

    let mut report = SyncReport::default();
    for (name, pem) in bundles {
        let url = format!("{base}{name}.pem");
        report.checked += 1;

        let current = match kv.get(&url).await {
            Ok(current) => current,
            Err(e) => {
                warn!(%url, error = %e, "read failed");
                report.failed += 1;
                continue;
            }
        };
        if current.as_deref() == Some(pem.as_str()) {
            debug!(%url, "up to date");
            continue;
        }

        info!(%url, "updating");
        match kv.put(&url, pem).await {
            Ok(()) => report.updated += 1,
            Err(e) => {
                warn!(%url, error = %e, "update failed");
                report.failed += 1;
            }
        }
    }
    report
}
