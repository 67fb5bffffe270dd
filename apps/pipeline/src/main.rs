use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pipeline::analysis_client::AnalysisClient;
use pipeline::config::{required, Config};
use pipeline::coordinator::Coordinator;
use pipeline::fetcher::ResumeFetcher;
use pipeline::models::applicant::ApplicantRecord;
use pipeline::store::ApplicationStore;
use pipeline::{export, ingest, migrate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (errors on malformed values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting applicant pipeline v{}", env!("CARGO_PKG_VERSION"));

    let task = std::env::args().nth(1).unwrap_or_else(|| "process".to_string());
    match task.as_str() {
        "fetch" => ingest::run(&config).await?,
        "process" => run_enrichment(&config).await?,
        "export" => export::run(&config)?,
        "migrate" => migrate::run(&config).await?,
        other => {
            eprintln!("unknown task '{other}'; expected one of: fetch, process, export, migrate");
            std::process::exit(2);
        }
    }

    Ok(())
}

/// The core task: enrich every not-yet-processed applicant in the input file.
async fn run_enrichment(config: &Config) -> Result<()> {
    let analysis_url = required(&config.analysis_url, "ANALYSIS_API_URL")?;

    let raw = fs::read_to_string(&config.input_file)
        .with_context(|| format!("Cannot read input collection '{}'", config.input_file))?;
    let input: Vec<ApplicantRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("Input collection '{}' is not valid JSON", config.input_file))?;
    info!(total = input.len(), "loaded input collection");

    let coordinator = Coordinator::new(
        Arc::new(ResumeFetcher::new()),
        Arc::new(AnalysisClient::new(analysis_url.to_string())),
        ApplicationStore::new(&config.output_file),
        config.max_workers,
    );

    let stats = coordinator.run(input).await?;
    info!(
        enriched = stats.enriched,
        errored = stats.errored,
        no_resume = stats.no_resume,
        skipped = stats.already_processed,
        "enrichment finished"
    );
    Ok(())
}
