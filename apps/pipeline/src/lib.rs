//! Applicant enrichment pipeline: fetches résumés, runs them through the
//! remote analysis service, and persists results incrementally so a run can
//! be killed and resumed without losing or repeating work.

pub mod analysis_client;
pub mod config;
pub mod coordinator;
pub mod errors;
pub mod export;
pub mod fetcher;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod processor;
pub mod store;
