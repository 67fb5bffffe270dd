//! Résumé fetcher: downloads a résumé PDF and extracts its plain text.
//!
//! Both steps are flaky in practice (CDN hiccups, half-uploaded PDFs), so the
//! whole download+extract is retried as a unit. Failures are soft: the caller
//! records them on the applicant and moves on.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Some WP media hosts reject clients without a browser-like identity.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("resume host returned status {0}")]
    Status(u16),

    #[error("PDF extraction failed: {0}")]
    Extract(String),

    #[error("document contained no extractable text")]
    EmptyText,

    #[error("all {0} fetch attempts exhausted")]
    Exhausted(u32),
}

/// Something that can turn a résumé URL into plain text. The production
/// implementation is [`ResumeFetcher`]; tests substitute fakes.
#[async_trait]
pub trait ResumeSource: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

/// Downloads résumé PDFs over HTTP and extracts text with `pdf-extract`.
#[derive(Clone)]
pub struct ResumeFetcher {
    client: Client,
}

impl ResumeFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(FETCH_TIMEOUT)
                .user_agent(BROWSER_USER_AGENT)
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    /// One download + extraction attempt.
    async fn fetch_once(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?.to_vec();
        debug!(url, size = bytes.len(), "downloaded resume document");

        // pdf-extract walks every page and joins the extracted text with
        // newlines; it is CPU-bound, so keep it off the async workers.
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            .map_err(|e| FetchError::Extract(format!("extraction task failed: {e}")))?
            .map_err(|e| FetchError::Extract(e.to_string()))?;

        if text.trim().is_empty() {
            return Err(FetchError::EmptyText);
        }
        Ok(text)
    }
}

impl Default for ResumeFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResumeSource for ResumeFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let mut last_error: Option<FetchError> = None;

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                warn!(
                    url,
                    attempt,
                    "resume fetch failed, retrying after {}s",
                    RETRY_DELAY.as_secs()
                );
                tokio::time::sleep(RETRY_DELAY).await;
            }

            match self.fetch_once(url).await {
                Ok(text) => return Ok(text),
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error.unwrap_or(FetchError::Exhausted(MAX_ATTEMPTS)))
    }
}
