use std::time::Duration;

use reqwest::{StatusCode, Url};
use tracing::{debug, warn};

use super::RecordSource;
use crate::error::{ExpertError, Result};
use crate::settings::Settings;

/// KEGG REST API client (`/get`, `/find`, `/link`).
pub struct KeggClient {
    http: reqwest::Client,
    base_url: Url,
    max_retries: u32,
    backoff: Duration,
}

impl KeggClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(concat!("kegg_expert/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let base_url = Url::parse(&settings.base_url)
            .map_err(|e| ExpertError::InvalidUrl(format!("{}: {}", settings.base_url, e)))?;
        Ok(Self {
            http,
            base_url,
            max_retries: settings.max_retries,
            backoff: Duration::from_millis(settings.backoff_ms),
        })
    }

    /// Flat-file text of one entry, or None if KEGG has no such entry.
    pub async fn get_entry(&self, entry: &str) -> Result<Option<String>> {
        self.request(&["get", entry]).await
    }

    /// Raw `/find/<db>/<query>` listing. Empty when nothing matches.
    pub async fn find(&self, db: &str, query: &str) -> Result<String> {
        Ok(self
            .request(&["find", db, query.trim()])
            .await?
            .unwrap_or_default())
    }

    /// Raw `/link/<target_db>/<source>` listing. Empty when nothing is linked.
    pub async fn link(&self, target_db: &str, source: &str) -> Result<String> {
        Ok(self
            .request(&["link", target_db, source])
            .await?
            .unwrap_or_default())
    }

    /// Base URL with each segment appended percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ExpertError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn request(&self, segments: &[&str]) -> Result<Option<String>> {
        let url = self.url(segments)?;
        let mut attempt = 0;

        loop {
            debug!("GET {}", url);
            let response = self.http.get(url.clone()).send().await?;
            let status = response.status();

            if status == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            if status.is_success() {
                let body = response.text().await?;
                return Ok(if body.trim().is_empty() { None } else { Some(body) });
            }

            let retryable = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
            if !retryable || attempt >= self.max_retries {
                return Err(ExpertError::Status(status.as_u16(), url.to_string()));
            }

            let backoff = backoff_for(self.backoff, attempt);
            warn!(
                "HTTP {} on {} (attempt {}/{}), backing off {:.1}s",
                status.as_u16(),
                url.path(),
                attempt + 1,
                self.max_retries,
                backoff.as_secs_f64()
            );
            tokio::time::sleep(backoff).await;
            attempt += 1;
        }
    }
}

/// `base * 2^attempt`, saturating instead of overflowing.
fn backoff_for(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.checked_pow(attempt).unwrap_or(u32::MAX))
}

impl RecordSource for KeggClient {
    async fn get(&self, entry: &str) -> Result<Option<String>> {
        self.get_entry(entry).await
    }

    async fn find(&self, db: &str, query: &str) -> Result<String> {
        KeggClient::find(self, db, query).await
    }
}

// ── Tests ──
