//! Analysis client: the single point of entry for the résumé analysis
//! service.
//!
//! The endpoint is an LLM-backed webhook, and its replies are messy in two
//! known ways: the JSON body may arrive wrapped in a single-element list, and
//! the structured payload is nested in an `output` string that is often
//! fenced in markdown code-block markers. Both quirks are normalized here so
//! the rest of the pipeline only ever sees an [`AnalysisResult`].

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::analysis::AnalysisResult;
use crate::models::applicant::ApplicantIdentity;

/// Generous timeout: the service runs an LLM pass over the full résumé text.
const ANALYSIS_TIMEOUT: Duration = Duration::from_secs(120);
const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(2);
/// How much of a bad reply body to keep for diagnostics.
const BODY_PREFIX_LEN: usize = 200;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("analysis endpoint returned status {status}: {body_prefix}")]
    Api { status: u16, body_prefix: String },

    #[error("analysis reply was an empty list")]
    EmptyReply,

    #[error("analysis reply carried no `output` string")]
    MissingOutput,

    #[error("failed to parse analysis payload: {source}; reply began: {body_prefix}")]
    Parse {
        #[source]
        source: serde_json::Error,
        body_prefix: String,
    },
}

/// Something that can analyze résumé text for an applicant. The production
/// implementation is [`AnalysisClient`]; tests substitute fakes.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(
        &self,
        identity: &ApplicantIdentity,
        resume_text: &str,
    ) -> Result<AnalysisResult, AnalysisError>;
}

#[derive(Clone)]
pub struct AnalysisClient {
    client: Client,
    endpoint: String,
}

impl AnalysisClient {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(ANALYSIS_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            endpoint,
        }
    }

    /// One request + decode attempt.
    async fn request_analysis(&self, input: &str) -> Result<AnalysisResult, AnalysisError> {
        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("input", input)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(AnalysisError::Api {
                status: status.as_u16(),
                body_prefix: body_prefix(&body),
            });
        }

        decode_reply(&body)
    }
}

#[async_trait]
impl Analyzer for AnalysisClient {
    async fn analyze(
        &self,
        identity: &ApplicantIdentity,
        resume_text: &str,
    ) -> Result<AnalysisResult, AnalysisError> {
        let input = build_input(identity, resume_text);
        let mut last_error: Option<AnalysisError> = None;

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                warn!(
                    applicant = %identity.name,
                    attempt,
                    "analysis call failed, retrying after {}s",
                    RETRY_DELAY.as_secs()
                );
                tokio::time::sleep(RETRY_DELAY).await;
            }

            match self.request_analysis(&input).await {
                Ok(result) => {
                    debug!(applicant = %identity.name, "analysis succeeded");
                    return Ok(result);
                }
                // Transport, HTTP and parse errors are all retried alike: the
                // backing LLM produces malformed output often enough that a
                // second attempt is worth the two seconds.
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error.unwrap_or(AnalysisError::EmptyReply))
    }
}

/// Builds the single text blob the service expects: an identity header, a
/// blank line, then the raw extracted résumé text.
fn build_input(identity: &ApplicantIdentity, resume_text: &str) -> String {
    format!(
        "{}\n{} | {} | {}\n\n{}",
        identity.name,
        identity.email,
        identity.linkedin.as_deref().unwrap_or(""),
        identity.mobile_number,
        resume_text
    )
}

/// Decodes a raw reply body into an [`AnalysisResult`], tolerating the two
/// known shape quirks (list wrapping, fenced `output` string).
fn decode_reply(body: &str) -> Result<AnalysisResult, AnalysisError> {
    let value: Value = serde_json::from_str(body).map_err(|source| AnalysisError::Parse {
        source,
        body_prefix: body_prefix(body),
    })?;

    let value = match value {
        Value::Array(mut items) => {
            if items.is_empty() {
                return Err(AnalysisError::EmptyReply);
            }
            items.remove(0)
        }
        other => other,
    };

    let output = value
        .get("output")
        .and_then(Value::as_str)
        .ok_or(AnalysisError::MissingOutput)?;

    let inner = strip_json_fences(output);
    serde_json::from_str(inner).map_err(|source| AnalysisError::Parse {
        source,
        body_prefix: body_prefix(output),
    })
}

/// Strips ```json ... ``` or ``` ... ``` code fences from the inner payload.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    for opener in ["```json", "```"] {
        if let Some(stripped) = text.strip_prefix(opener) {
            let stripped = stripped.trim_start();
            return stripped
                .strip_suffix("```")
                .map(str::trim)
                .unwrap_or(stripped);
        }
    }
    text
}

fn body_prefix(body: &str) -> String {
    body.chars().take(BODY_PREFIX_LEN).collect()
}
