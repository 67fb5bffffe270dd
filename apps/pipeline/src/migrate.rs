//! One-time migration of the processed collection into the relational store.
//!
//! Transforms each enriched record into the `applicants` table shape:
//! AI fields flattened into columns, `resume_id` renamed to `resume_link`,
//! every row attached to the workspace and (when resolvable) a valid job.
//! Upserts keyed on `id` make the task safe to re-run.

use std::collections::HashSet;
use std::fs;

use chrono::NaiveDateTime;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{required, Config};
use crate::errors::AppError;
use crate::models::applicant::{value_as_text, ApplicantRecord};

const UPSERT_BATCH: usize = 50;

const UPSERT_SQL: &str = r#"
INSERT INTO applicants
    (id, applied_at, name, email, mobile_number, linkedin, portfolio_link,
     current_ctc, expected_ctc, notice_period, resume_link, job_id,
     workspace_id, status, ats_score, social_links, current_job_title,
     gender, total_experience_years, highest_qualification, skills,
     domains_worked, notable_achievement, previous_companies_names, projects)
VALUES
    ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
     $17, $18, $19, $20, $21, $22, $23, $24, $25)
ON CONFLICT (id) DO UPDATE SET
    applied_at = EXCLUDED.applied_at,
    name = EXCLUDED.name,
    email = EXCLUDED.email,
    mobile_number = EXCLUDED.mobile_number,
    linkedin = EXCLUDED.linkedin,
    portfolio_link = EXCLUDED.portfolio_link,
    current_ctc = EXCLUDED.current_ctc,
    expected_ctc = EXCLUDED.expected_ctc,
    notice_period = EXCLUDED.notice_period,
    resume_link = EXCLUDED.resume_link,
    job_id = EXCLUDED.job_id,
    workspace_id = EXCLUDED.workspace_id,
    status = EXCLUDED.status,
    ats_score = EXCLUDED.ats_score,
    social_links = EXCLUDED.social_links,
    current_job_title = EXCLUDED.current_job_title,
    gender = EXCLUDED.gender,
    total_experience_years = EXCLUDED.total_experience_years,
    highest_qualification = EXCLUDED.highest_qualification,
    skills = EXCLUDED.skills,
    domains_worked = EXCLUDED.domains_worked,
    notable_achievement = EXCLUDED.notable_achievement,
    previous_companies_names = EXCLUDED.previous_companies_names,
    projects = EXCLUDED.projects
"#;

pub async fn run(config: &Config) -> Result<(), AppError> {
    let database_url = required(&config.database_url, "DATABASE_URL")?;
    let pool = create_pool(database_url).await?;

    let workspace_id: Option<Uuid> = sqlx::query_scalar("SELECT id FROM workspaces LIMIT 1")
        .fetch_optional(&pool)
        .await?;
    let workspace_id = workspace_id.ok_or_else(|| {
        AppError::Validation("No workspace found. Create a workspace before migrating.".to_string())
    })?;
    info!(%workspace_id, "using workspace");

    let job_ids: Vec<Option<String>> = sqlx::query_scalar("SELECT job_id::text FROM jobs")
        .fetch_all(&pool)
        .await?;
    let valid_job_ids: HashSet<String> = job_ids
        .into_iter()
        .flatten()
        .map(|id| id.trim().to_string())
        .collect();
    info!(jobs = valid_job_ids.len(), "loaded valid job ids");

    let raw = fs::read_to_string(&config.output_file)?;
    let records: Vec<ApplicantRecord> = serde_json::from_str(&raw)?;
    info!(count = records.len(), "migrating applicants");

    let mut migrated = 0usize;
    for batch in records.chunks(UPSERT_BATCH) {
        upsert_batch(&pool, workspace_id, &valid_job_ids, batch).await?;
        migrated += batch.len();
        info!(progress = migrated, total = records.len(), "batch upserted");
    }

    info!("migration complete");
    Ok(())
}

async fn create_pool(database_url: &str) -> Result<PgPool, AppError> {
    info!("Connecting to PostgreSQL...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Upserts one batch inside a transaction so a mid-batch failure leaves no
/// half-applied rows.
async fn upsert_batch(
    pool: &PgPool,
    workspace_id: Uuid,
    valid_job_ids: &HashSet<String>,
    batch: &[ApplicantRecord],
) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    for record in batch {
        let ai = record.ai_data.clone().unwrap_or_default();
        let projects = serde_json::to_value(&ai.projects)?;
        let job_id = normalize_job_id(record.job_id.as_ref(), valid_job_ids);
        if record.job_id.is_some() && job_id.is_none() {
            warn!(id = record.id, raw = ?record.job_id, "job id unresolvable, storing NULL");
        }

        sqlx::query(UPSERT_SQL)
            .bind(record.id as i64)
            .bind(parse_applied_at(record.date.as_deref()))
            .bind(&record.name)
            .bind(&record.email)
            .bind(&record.mobile_number)
            .bind(&record.linkedin)
            .bind(&record.portfolio_link)
            .bind(record.current_ctc.as_ref().map(value_as_text))
            .bind(record.expected_ctc.as_ref().map(value_as_text))
            .bind(record.notice_period.as_ref().map(value_as_text))
            .bind(&record.resume_id)
            .bind(job_id)
            .bind(workspace_id)
            .bind("new")
            .bind(ai.ats_score)
            .bind(&ai.social_links)
            .bind(&ai.current_job_title)
            .bind(&ai.gender)
            .bind(ai.total_experience_years)
            .bind(&ai.highest_qualification)
            .bind(&ai.skills)
            .bind(&ai.domains_worked)
            .bind(&ai.notable_achievement)
            .bind(&ai.previous_companies_names)
            .bind(projects)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Normalizes a loose listing job id: trims text, maps the feed's various
/// null spellings to NULL, and drops ids the jobs table doesn't know.
fn normalize_job_id(raw: Option<&Value>, valid_job_ids: &HashSet<String>) -> Option<String> {
    let text = match raw? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => return None,
        other => value_as_text(other),
    };

    if text.is_empty() || text == "None" || text == "null" {
        return None;
    }
    valid_job_ids.contains(&text).then_some(text)
}

fn parse_applied_at(date: Option<&str>) -> Option<NaiveDateTime> {
    let date = date?;
    match NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S") {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(date, error = %e, "unparsable application date, storing NULL");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_ids() -> HashSet<String> {
        ["7".to_string(), "12".to_string()].into_iter().collect()
    }

    #[test]
    fn test_normalize_job_id_numeric() {
        let raw = serde_json::json!(7);
        assert_eq!(
            normalize_job_id(Some(&raw), &valid_ids()),
            Some("7".to_string())
        );
    }

    #[test]
    fn test_normalize_job_id_padded_string() {
        let raw = serde_json::json!(" 12 ");
        assert_eq!(
            normalize_job_id(Some(&raw), &valid_ids()),
            Some("12".to_string())
        );
    }

    #[test]
    fn test_normalize_job_id_null_spellings() {
        for raw in [
            serde_json::json!("None"),
            serde_json::json!("null"),
            serde_json::json!(""),
            serde_json::Value::Null,
        ] {
            assert_eq!(normalize_job_id(Some(&raw), &valid_ids()), None);
        }
        assert_eq!(normalize_job_id(None, &valid_ids()), None);
    }

    #[test]
    fn test_normalize_job_id_unknown_job() {
        let raw = serde_json::json!(99);
        assert_eq!(normalize_job_id(Some(&raw), &valid_ids()), None);
    }

    #[test]
    fn test_parse_applied_at_wp_format() {
        let parsed = parse_applied_at(Some("2025-11-03T09:12:44")).unwrap();
        assert_eq!(parsed.to_string(), "2025-11-03 09:12:44");
    }

    #[test]
    fn test_parse_applied_at_garbage_is_none() {
        assert_eq!(parse_applied_at(Some("last tuesday")), None);
        assert_eq!(parse_applied_at(None), None);
    }
}
