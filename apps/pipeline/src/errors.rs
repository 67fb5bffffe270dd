use thiserror::Error;

/// Application-level error type for the task entry points.
///
/// Per-item soft failures (fetch, analysis) never appear here; they live in
/// [`crate::fetcher::FetchError`] and [`crate::analysis_client::AnalysisError`]
/// and are absorbed into the record as annotations. `AppError` is reserved for
/// conditions that abort a task: bad configuration, unreadable input, store
/// write failure, database errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
