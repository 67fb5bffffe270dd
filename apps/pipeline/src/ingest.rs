//! Listing ingestion: pages through the applications feed and writes the
//! input collection file.
//!
//! The feed is WP-style: `per_page`/`page` query params, 100 records a page,
//! and three different ways of saying "you're past the end" (an empty page, a
//! short page, an HTTP 400, or an error object in a 200 body). All of them
//! end the walk without failing the task.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::{required, Config};
use crate::errors::AppError;
use crate::fetcher::BROWSER_USER_AGENT;
use crate::models::applicant::ApplicantRecord;

const PER_PAGE: usize = 100;
/// Politeness pause between page requests.
const PAGE_DELAY: Duration = Duration::from_millis(500);
const LISTING_TIMEOUT: Duration = Duration::from_secs(30);

/// What one decoded listing page means for the walk.
#[derive(Debug)]
enum PageOutcome {
    Records(Vec<ApplicantRecord>),
    /// The feed signalled the end (error object or undecodable body).
    EndOfFeed(String),
}

pub async fn run(config: &Config) -> Result<(), AppError> {
    let listing_url = required(&config.listing_url, "LISTING_URL")?;

    let client = Client::builder()
        .timeout(LISTING_TIMEOUT)
        .user_agent(BROWSER_USER_AGENT)
        .build()?;

    let records = fetch_listing(&client, listing_url).await?;

    info!(
        count = records.len(),
        path = %config.input_file,
        "writing input collection"
    );
    let serialized = serde_json::to_string_pretty(&records)?;
    std::fs::write(&config.input_file, serialized)?;
    Ok(())
}

/// Walks the paginated feed until any end-of-data signal.
async fn fetch_listing(client: &Client, listing_url: &str) -> Result<Vec<ApplicantRecord>, AppError> {
    let mut all = Vec::new();
    let mut page: u32 = 1;

    loop {
        info!(page, "fetching listing page");
        let response = client
            .get(listing_url)
            .query(&[("per_page", PER_PAGE as u32), ("page", page)])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST {
            // WP returns 400 for a page number past the end
            info!("listing returned 400, reached end of pages");
            break;
        }
        if !status.is_success() {
            warn!(status = status.as_u16(), "listing request failed, stopping");
            break;
        }

        let body = response.text().await?;
        match decode_page(&body) {
            PageOutcome::Records(records) if records.is_empty() => {
                info!("empty page, no more data");
                break;
            }
            PageOutcome::Records(records) => {
                let short_page = records.len() < PER_PAGE;
                all.extend(records);
                info!(total = all.len(), "retrieved page");
                if short_page {
                    info!("short page, assuming end of data");
                    break;
                }
            }
            PageOutcome::EndOfFeed(reason) => {
                warn!(%reason, "listing signalled end of feed");
                break;
            }
        }

        page += 1;
        tokio::time::sleep(PAGE_DELAY).await;
    }

    Ok(all)
}

fn decode_page(body: &str) -> PageOutcome {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => return PageOutcome::EndOfFeed(format!("undecodable page body: {e}")),
    };

    match value {
        Value::Array(_) => match serde_json::from_value::<Vec<ApplicantRecord>>(value) {
            Ok(records) => PageOutcome::Records(records),
            Err(e) => PageOutcome::EndOfFeed(format!("unexpected record shape: {e}")),
        },
        // WP error replies look like {"code": "...", "message": "..."}
        Value::Object(map) if map.contains_key("code") => {
            let message = map
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown API error");
            PageOutcome::EndOfFeed(message.to_string())
        }
        _ => PageOutcome::EndOfFeed("unexpected data format".to_string()),
    }
}
