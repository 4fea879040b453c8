//! Virus scanning of uploaded content.
//!
//! The HTTP scanner speaks the ClamAV REST convention: the raw bytes are
//! PUT to the scan endpoint and the response is a JSON array of
//! `{"Filename": .., "Result": ..}` entries, with `"OK"` meaning clean.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Outcome of scanning one payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScanVerdict {
    Clean,
    Infected,
    /// The scanner could not give an answer.
    Unavailable(String),
}

#[async_trait]
pub trait VirusScanner: Send + Sync {
    async fn scan(&self, content: &[u8]) -> ScanVerdict;
}

#[derive(Debug, Deserialize)]
struct ScanResult {
    #[serde(rename = "Filename", default)]
    filename: Option<String>,
    #[serde(rename = "Result")]
    result: String,
}

/// Scanner backed by an HTTP scanning service.
pub struct HttpVirusScanner {
    client: reqwest::Client,
    url: String,
}

impl HttpVirusScanner {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request(&self, content: &[u8]) -> Result<Vec<ScanResult>, reqwest::Error> {
        self.client
            .put(&self.url)
            .body(content.to_vec())
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<ScanResult>>()
            .await
    }
}

#[async_trait]
impl VirusScanner for HttpVirusScanner {
    async fn scan(&self, content: &[u8]) -> ScanVerdict {
        let results = match self.request(content).await {
            Ok(results) => results,
            Err(e) => {
                warn!("virus scan request to {} failed: {e}", self.url);
                return ScanVerdict::Unavailable(e.to_string());
            }
        };

        if results.is_empty() {
            return ScanVerdict::Unavailable("scanner returned no results".to_string());
        }

        match results
            .iter()
            .find(|r| !r.result.eq_ignore_ascii_case("OK"))
        {
            Some(hit) => {
                warn!(
                    "virus scan flagged upload ({}): {}",
                    hit.filename.as_deref().unwrap_or("unnamed"),
                    hit.result
                );
                ScanVerdict::Infected
            }
            None => {
                debug!("virus scan clean ({} bytes)", content.len());
                ScanVerdict::Clean
            }
        }
    }
}
