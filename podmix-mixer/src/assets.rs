//! Intro/outro music retrieval
//!
//! Music beds come from an HTTP(S) URL or a local file. Requests use the
//! configured timeout and are never retried; any failure (connection,
//! timeout, non-2xx status, empty body, unreadable file) is a fetch error
//! and fails the episode rather than silently skipping the music.

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

const USER_AGENT: &str = concat!("podmix/", env!("CARGO_PKG_VERSION"));

/// Where an intro or outro bed comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    Url(String),
    File(PathBuf),
}

impl AssetSource {
    /// `http://` and `https://` are URLs; `file://` and anything else are paths
    pub fn parse(source: &str) -> Self {
        let trimmed = source.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            AssetSource::Url(trimmed.to_string())
        } else if let Some(path) = trimmed.strip_prefix("file://") {
            AssetSource::File(PathBuf::from(path))
        } else {
            AssetSource::File(PathBuf::from(trimmed))
        }
    }
}

impl std::fmt::Display for AssetSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetSource::Url(url) => write!(f, "{}", url),
            AssetSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Fetches encoded music beds
pub struct AssetFetcher {
    http_client: reqwest::Client,
}

impl AssetFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Fetch(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http_client })
    }

    /// Retrieve the encoded bytes of an asset
    pub async fn fetch(&self, source: &AssetSource) -> Result<Vec<u8>> {
        let bytes = match source {
            AssetSource::Url(url) => self.fetch_url(url).await?,
            AssetSource::File(path) => tokio::fs::read(path).await.map_err(|e| {
                Error::Fetch(format!("Failed to read {}: {}", path.display(), e))
            })?,
        };

        if bytes.is_empty() {
            return Err(Error::Fetch(format!("Asset {} is empty", source)));
        }

        info!("Fetched {} ({} bytes)", source, bytes.len());
        Ok(bytes)
    }

    async fn fetch_url(&self, url: &str) -> Result<Vec<u8>> {
        debug!("GET {}", url);

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch(format!("{} returned HTTP {}", url, status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Fetch(format!("Failed to read body from {}: {}", url, e)))?;

        Ok(body.to_vec())
    }
}
