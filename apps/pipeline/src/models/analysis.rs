//! Structured output of the remote résumé analysis service.
//!
//! The service is LLM-backed and its schema has drifted over time, so every
//! field is optional, list fields default to empty, and unrecognized keys are
//! kept in a raw bag rather than discarded. The pipeline itself treats the
//! payload as pass-through; only the flattening consumers (CSV export, DB
//! migration) look inside.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub ats_score: Option<f64>,
    #[serde(default)]
    pub social_links: Vec<String>,
    pub current_job_title: Option<String>,
    pub gender: Option<String>,
    pub total_experience_years: Option<f64>,
    pub highest_qualification: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub domains_worked: Vec<String>,
    pub notable_achievement: Option<String>,
    /// Older service versions emitted this misspelled as
    /// `prevous_companies_names`; both spellings are accepted.
    #[serde(default, alias = "prevous_companies_names")]
    pub previous_companies_names: Vec<String>,
    #[serde(default)]
    pub projects: Vec<Project>,

    /// Keys the current schema doesn't model. Kept so nothing is lost when
    /// the record is re-serialized to the store.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
}
