//! Per-applicant processing: fetch the résumé, analyze it, annotate the
//! record.
//!
//! This function is infallible: every branch hands a record back to the
//! coordinator, so no code path silently drops an applicant. Remote failures
//! become terminal annotations. An annotated record is persisted and will not
//! be re-attempted on a later run unless it is removed from the store by
//! hand; each applicant gets at most one enrichment attempt.

use tracing::{info, warn};

use crate::analysis_client::Analyzer;
use crate::fetcher::ResumeSource;
use crate::models::applicant::ApplicantRecord;

/// Terminal marker for a résumé that could not be downloaded or read.
pub const FETCH_FAILED_MARKER: &str = "Failed to extract PDF text";
/// Terminal marker for an analysis call that exhausted its retries.
pub const ANALYSIS_FAILED_MARKER: &str = "API analysis failed";

/// Runs one applicant through fetch + analysis and returns the annotated
/// record.
pub async fn process_record(
    source: &dyn ResumeSource,
    analyzer: &dyn Analyzer,
    mut record: ApplicantRecord,
) -> ApplicantRecord {
    let Some(url) = record.resume_url().map(str::to_owned) else {
        info!(id = record.id, name = %record.name, "no resume link, skipping analysis");
        return record;
    };

    let resume_text = match source.fetch_text(&url).await {
        Ok(text) => text,
        Err(e) => {
            warn!(id = record.id, %url, error = %e, "resume text extraction failed");
            record.analysis_error = Some(FETCH_FAILED_MARKER.to_string());
            return record;
        }
    };

    match analyzer.analyze(&record.identity(), &resume_text).await {
        Ok(result) => {
            info!(id = record.id, name = %record.name, "analysis complete");
            record.ai_data = Some(result);
        }
        Err(e) => {
            warn!(id = record.id, error = %e, "analysis failed");
            record.analysis_error = Some(ANALYSIS_FAILED_MARKER.to_string());
        }
    }

    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::analysis_client::AnalysisError;
    use crate::fetcher::FetchError;
    use crate::models::analysis::AnalysisResult;
    use crate::models::applicant::ApplicantIdentity;

    struct StubSource {
        outcome: Result<String, ()>,
    }

    #[async_trait]
    impl ResumeSource for StubSource {
        async fn fetch_text(&self, _url: &str) -> Result<String, FetchError> {
            match &self.outcome {
                Ok(text) => Ok(text.clone()),
                Err(()) => Err(FetchError::EmptyText),
            }
        }
    }

    struct StubAnalyzer {
        outcome: Result<AnalysisResult, ()>,
    }

    #[async_trait]
    impl Analyzer for StubAnalyzer {
        async fn analyze(
            &self,
            _identity: &ApplicantIdentity,
            _resume_text: &str,
        ) -> Result<AnalysisResult, AnalysisError> {
            match &self.outcome {
                Ok(result) => Ok(result.clone()),
                Err(()) => Err(AnalysisError::EmptyReply),
            }
        }
    }

    fn record_with_resume(resume: Option<&str>) -> ApplicantRecord {
        serde_json::from_value(serde_json::json!({
            "id": 1,
            "name": "Test Applicant",
            "email": "t@example.com",
            "mobile_number": "123",
            "resume_id": resume,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_no_resume_link_returns_unannotated_record() {
        let source = StubSource { outcome: Err(()) };
        let analyzer = StubAnalyzer { outcome: Err(()) };
        let out = process_record(&source, &analyzer, record_with_resume(None)).await;
        assert!(out.ai_data.is_none());
        assert!(out.analysis_error.is_none());
    }

    #[tokio::test]
    async fn test_fetch_failure_attaches_marker() {
        let source = StubSource { outcome: Err(()) };
        let analyzer = StubAnalyzer {
            outcome: Ok(AnalysisResult::default()),
        };
        let out = process_record(&source, &analyzer, record_with_resume(Some("https://cv/1.pdf"))).await;
        assert_eq!(out.analysis_error.as_deref(), Some(FETCH_FAILED_MARKER));
        assert!(out.ai_data.is_none());
    }

    #[tokio::test]
    async fn test_analysis_failure_attaches_marker() {
        let source = StubSource {
            outcome: Ok("resume text".to_string()),
        };
        let analyzer = StubAnalyzer { outcome: Err(()) };
        let out = process_record(&source, &analyzer, record_with_resume(Some("https://cv/1.pdf"))).await;
        assert_eq!(out.analysis_error.as_deref(), Some(ANALYSIS_FAILED_MARKER));
        assert!(out.ai_data.is_none());
    }

    #[tokio::test]
    async fn test_success_attaches_analysis_and_no_error() {
        let source = StubSource {
            outcome: Ok("resume text".to_string()),
        };
        let analyzer = StubAnalyzer {
            outcome: Ok(AnalysisResult {
                ats_score: Some(91.0),
                ..Default::default()
            }),
        };
        let out = process_record(&source, &analyzer, record_with_resume(Some("https://cv/1.pdf"))).await;
        assert_eq!(out.ai_data.as_ref().unwrap().ats_score, Some(91.0));
        assert!(out.analysis_error.is_none());
    }
}
