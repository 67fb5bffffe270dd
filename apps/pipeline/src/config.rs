use anyhow::{Context, Result};

use crate::errors::AppError;

/// Application configuration loaded from environment variables.
///
/// File paths and the worker bound have working defaults; the endpoint and
/// database URLs are only required by the tasks that use them, so they stay
/// optional here and are checked at task start via [`required`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Listing endpoint for the `fetch` task (paginated applicant feed).
    pub listing_url: Option<String>,
    /// Analysis endpoint for the `process` task.
    pub analysis_url: Option<String>,
    /// Postgres URL for the `migrate` task.
    pub database_url: Option<String>,
    pub input_file: String,
    pub output_file: String,
    pub export_file: String,
    /// Upper bound on concurrently processed applicants. Both remote services
    /// throttle past ~20 parallel callers.
    pub max_workers: usize,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            listing_url: std::env::var("LISTING_URL").ok(),
            analysis_url: std::env::var("ANALYSIS_API_URL").ok(),
            database_url: std::env::var("DATABASE_URL").ok(),
            input_file: env_or("INPUT_FILE", "fetched_applications.json"),
            output_file: env_or("OUTPUT_FILE", "processed_applications.json"),
            export_file: env_or("EXPORT_FILE", "processed_applications.csv"),
            max_workers: env_or("MAX_WORKERS", "20")
                .parse::<usize>()
                .context("MAX_WORKERS must be a positive integer")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

/// Unwraps an optional config value, naming the missing variable otherwise.
pub fn required<'a>(value: &'a Option<String>, key: &str) -> Result<&'a str, AppError> {
    value
        .as_deref()
        .ok_or_else(|| AppError::Config(format!("Required environment variable '{key}' is not set")))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_present() {
        let value = Some("postgres://localhost/app".to_string());
        assert_eq!(required(&value, "DATABASE_URL").unwrap(), "postgres://localhost/app");
    }

    #[test]
    fn test_required_missing_names_the_variable() {
        let err = required(&None, "ANALYSIS_API_URL").unwrap_err();
        assert!(err.to_string().contains("ANALYSIS_API_URL"));
    }
}
