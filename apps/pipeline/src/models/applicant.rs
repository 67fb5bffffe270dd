//! Applicant records as served by the listing endpoint, plus the enrichment
//! fields this pipeline attaches to them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::analysis::AnalysisResult;

/// One job application as fetched from the listing API.
///
/// The listing is loosely typed: CTC and notice-period fields arrive as
/// strings or numbers depending on how the form was filled in, so they are
/// kept as raw JSON values and only rendered to text at the edges (CSV
/// export, database migration). Unknown keys are preserved in `extra` so a
/// listing schema change never drops data on the round trip through the
/// store.
///
/// Enrichment invariant: at most one of `ai_data` / `analysis_error` is ever
/// populated. The item processor is the only code that sets either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantRecord {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub mobile_number: String,
    pub linkedin: Option<String>,
    pub portfolio_link: Option<String>,
    pub current_ctc: Option<Value>,
    pub expected_ctc: Option<Value>,
    pub notice_period: Option<Value>,
    /// URL of the applicant's résumé document. Despite the name this is a
    /// full URL, not a numeric attachment id.
    pub resume_id: Option<String>,
    pub job_id: Option<Value>,
    pub date: Option<String>,

    /// Structured analysis attached on successful enrichment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_data: Option<AnalysisResult>,
    /// Terminal failure marker attached when fetch or analysis exhausted its
    /// retries. Records carrying this are not retried on later runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_error: Option<String>,

    /// Listing fields we don't model explicitly.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl ApplicantRecord {
    /// Returns the résumé URL, treating an empty string the same as absent.
    pub fn resume_url(&self) -> Option<&str> {
        self.resume_id.as_deref().filter(|url| !url.trim().is_empty())
    }

    /// Identity fields forwarded to the analysis service alongside the
    /// extracted résumé text.
    pub fn identity(&self) -> ApplicantIdentity {
        ApplicantIdentity {
            name: self.name.clone(),
            email: self.email.clone(),
            linkedin: self.linkedin.clone(),
            mobile_number: self.mobile_number.clone(),
        }
    }
}

/// The contact fields the analysis service wants in its input header.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicantIdentity {
    pub name: String,
    pub email: String,
    pub linkedin: Option<String>,
    pub mobile_number: String,
}

/// Renders a loose listing value as plain text: strings unquoted, numbers as
/// written, null as empty.
pub fn value_as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_record_json() -> &'static str {
        r#"{
            "id": 4211,
            "name": "Asha Rao",
            "email": "asha@example.com",
            "mobile_number": "9876543210",
            "linkedin": "https://linkedin.com/in/asha",
            "portfolio_link": null,
            "current_ctc": "12 LPA",
            "expected_ctc": 18,
            "notice_period": "30 days",
            "resume_id": "https://cdn.example.com/resumes/4211.pdf",
            "job_id": 7,
            "date": "2025-11-03T09:12:44"
        }"#
    }

    #[test]
    fn test_record_deserializes_from_listing_shape() {
        let record: ApplicantRecord = serde_json::from_str(minimal_record_json()).unwrap();
        assert_eq!(record.id, 4211);
        assert_eq!(record.name, "Asha Rao");
        assert_eq!(record.resume_url(), Some("https://cdn.example.com/resumes/4211.pdf"));
        assert!(record.ai_data.is_none());
        assert!(record.analysis_error.is_none());
        // expected_ctc arrived as a number and stays one
        assert_eq!(record.expected_ctc, Some(serde_json::json!(18)));
    }

    #[test]
    fn test_empty_resume_url_counts_as_absent() {
        let mut record: ApplicantRecord = serde_json::from_str(minimal_record_json()).unwrap();
        record.resume_id = Some("   ".to_string());
        assert_eq!(record.resume_url(), None);
        record.resume_id = None;
        assert_eq!(record.resume_url(), None);
    }

    #[test]
    fn test_enrichment_fields_skipped_when_absent() {
        let record: ApplicantRecord = serde_json::from_str(minimal_record_json()).unwrap();
        let out = serde_json::to_string(&record).unwrap();
        assert!(!out.contains("ai_data"));
        assert!(!out.contains("analysis_error"));
    }

    #[test]
    fn test_unknown_listing_keys_survive_round_trip() {
        let mut value: serde_json::Value = serde_json::from_str(minimal_record_json()).unwrap();
        value["source_campaign"] = serde_json::json!("careers-page");
        let record: ApplicantRecord = serde_json::from_value(value).unwrap();
        assert_eq!(
            record.extra.get("source_campaign"),
            Some(&serde_json::json!("careers-page"))
        );
        let out = serde_json::to_value(&record).unwrap();
        assert_eq!(out["source_campaign"], serde_json::json!("careers-page"));
    }

    #[test]
    fn test_value_as_text_rendering() {
        assert_eq!(value_as_text(&serde_json::json!("12 LPA")), "12 LPA");
        assert_eq!(value_as_text(&serde_json::json!(18)), "18");
        assert_eq!(value_as_text(&serde_json::Value::Null), "");
    }
}
