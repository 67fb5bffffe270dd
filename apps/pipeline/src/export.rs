//! CSV export: flattens the processed collection into spreadsheet columns.
//!
//! Records that failed analysis (or never had a résumé) export their base
//! columns with the AI columns left blank, mirroring how reviewers read the
//! sheet: a blank block means "nothing to see", the error column says why.

use std::fs;

use tracing::info;

use crate::config::Config;
use crate::errors::AppError;
use crate::models::analysis::Project;
use crate::models::applicant::{value_as_text, ApplicantRecord};

const HEADER: [&str; 24] = [
    "id",
    "name",
    "email",
    "mobile_number",
    "linkedin",
    "portfolio_link",
    "current_ctc",
    "expected_ctc",
    "notice_period",
    "resume_id",
    "job_id",
    "date",
    "analysis_error",
    "ai_ats_score",
    "ai_social_links",
    "ai_current_job_title",
    "ai_gender",
    "ai_total_experience_years",
    "ai_highest_qualification",
    "ai_skills",
    "ai_domains_worked",
    "ai_notable_achievement",
    "ai_previous_companies",
    "ai_projects",
];

pub fn run(config: &Config) -> Result<(), AppError> {
    let raw = fs::read_to_string(&config.output_file)?;
    let records: Vec<ApplicantRecord> = serde_json::from_str(&raw)?;

    let mut writer = csv::Writer::from_path(&config.export_file)?;
    writer.write_record(HEADER)?;
    for record in &records {
        writer.write_record(flatten_record(record))?;
    }
    writer.flush()?;

    info!(
        rows = records.len(),
        path = %config.export_file,
        "export complete"
    );
    Ok(())
}

fn flatten_record(record: &ApplicantRecord) -> Vec<String> {
    let mut row = vec![
        record.id.to_string(),
        record.name.clone(),
        record.email.clone(),
        record.mobile_number.clone(),
        record.linkedin.clone().unwrap_or_default(),
        record.portfolio_link.clone().unwrap_or_default(),
        record.current_ctc.as_ref().map(value_as_text).unwrap_or_default(),
        record.expected_ctc.as_ref().map(value_as_text).unwrap_or_default(),
        record.notice_period.as_ref().map(value_as_text).unwrap_or_default(),
        record.resume_id.clone().unwrap_or_default(),
        record.job_id.as_ref().map(value_as_text).unwrap_or_default(),
        record.date.clone().unwrap_or_default(),
        record.analysis_error.clone().unwrap_or_default(),
    ];

    // A record with an error marker keeps its AI columns blank even if a
    // partial payload somehow slipped in alongside.
    match (&record.ai_data, &record.analysis_error) {
        (Some(ai), None) => {
            row.push(ai.ats_score.map(|s| s.to_string()).unwrap_or_default());
            row.push(ai.social_links.join("\n"));
            row.push(ai.current_job_title.clone().unwrap_or_default());
            row.push(ai.gender.clone().unwrap_or_default());
            row.push(
                ai.total_experience_years
                    .map(|y| y.to_string())
                    .unwrap_or_default(),
            );
            row.push(ai.highest_qualification.clone().unwrap_or_default());
            row.push(ai.skills.join(", "));
            row.push(ai.domains_worked.join(", "));
            row.push(ai.notable_achievement.clone().unwrap_or_default());
            row.push(ai.previous_companies_names.join(", "));
            row.push(join_projects(&ai.projects));
        }
        _ => row.extend(std::iter::repeat(String::new()).take(11)),
    }

    row
}

fn join_projects(projects: &[Project]) -> String {
    let blocks: Vec<String> = projects
        .iter()
        .map(|p| {
            format!(
                "Name: {}\nDescription: {}\nURL: {}",
                p.name.as_deref().unwrap_or("N/A"),
                p.description.as_deref().unwrap_or("N/A"),
                p.url.as_deref().unwrap_or("N/A"),
            )
        })
        .collect();
    blocks.join("\n---\n")
}
