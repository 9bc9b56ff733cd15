use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cli::config::ReaderSettings;
use crate::error::CrawlError;
use crate::fetch::{PageReader, ReaderResponse};

/// Environment variable consulted when the job config carries no API key.
const API_KEY_ENV: &str = "READER_API_KEY";

#[derive(Debug, Serialize)]
struct ReaderRequest<'a> {
    url: &'a str,
    options: &'a str,
}

/// Envelope the reader service wraps its payload in.
#[derive(Debug, Deserialize)]
struct ReaderEnvelope {
    #[serde(default)]
    data: Option<ReaderResponse>,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for the external content-extraction service.
///
/// Posts the target URL and parses the extracted markdown, links and images
/// out of the JSON envelope. Timeouts live here; the frontier imposes none of
/// its own.
pub struct ReaderClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ReaderClient {
    pub fn new(settings: &ReaderSettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok());

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to create HTTP client for the reader service")?;

        Ok(Self {
            client,
            base_url: settings.base_url.clone(),
            api_key,
        })
    }

    fn fetch_error(url: &str, reason: impl ToString) -> CrawlError {
        CrawlError::Fetch {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl PageReader for ReaderClient {
    async fn fetch(&self, url: &str) -> Result<ReaderResponse, CrawlError> {
        let request = ReaderRequest {
            url,
            options: "Markdown",
        };

        debug!("Requesting extraction of {}", url);

        let mut builder = self
            .client
            .post(&self.base_url)
            .header("Accept", "application/json")
            .header("X-With-Links-Summary", "true")
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Self::fetch_error(url, e))?
            .error_for_status()
            .map_err(|e| Self::fetch_error(url, e))?;

        let envelope: ReaderEnvelope = response
            .json()
            .await
            .map_err(|e| Self::fetch_error(url, e))?;

        if let Some(error) = envelope.error {
            return Err(Self::fetch_error(url, error));
        }

        envelope
            .data
            .ok_or_else(|| Self::fetch_error(url, "reader service returned no data"))
    }
}
