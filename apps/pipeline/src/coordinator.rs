//! Pipeline coordinator: bounded fan-out over pending applicants with
//! crash-safe incremental persistence.
//!
//! All pending records are submitted up front; a semaphore caps how many are
//! in flight at once because both remote services throttle heavy callers.
//! Completions are consumed in completion order on this one coordinating
//! task, which appends to the collection and rewrites the store before
//! touching the next completion. That single-owner loop is the whole
//! serialization story: persisted state can never diverge from the in-memory
//! collection, and every save is a superset of the one before it.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::analysis_client::Analyzer;
use crate::errors::AppError;
use crate::fetcher::ResumeSource;
use crate::models::applicant::ApplicantRecord;
use crate::processor::process_record;
use crate::store::ApplicationStore;

/// Outcome counts for one pipeline run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunStats {
    pub total_input: usize,
    pub already_processed: usize,
    pub enriched: usize,
    pub errored: usize,
    pub no_resume: usize,
    pub faulted: usize,
}

pub struct Coordinator {
    source: Arc<dyn ResumeSource>,
    analyzer: Arc<dyn Analyzer>,
    store: ApplicationStore,
    max_in_flight: usize,
}

impl Coordinator {
    pub fn new(
        source: Arc<dyn ResumeSource>,
        analyzer: Arc<dyn Analyzer>,
        store: ApplicationStore,
        max_in_flight: usize,
    ) -> Self {
        Self {
            source,
            analyzer,
            store,
            max_in_flight,
        }
    }

    /// Runs the pipeline to completion over `input`, resuming from whatever
    /// the store already holds.
    pub async fn run(&self, input: Vec<ApplicantRecord>) -> Result<RunStats, AppError> {
        let mut processed = self.store.load()?;
        let mut dispatched: HashSet<u64> = processed.iter().map(|r| r.id).collect();

        let mut stats = RunStats {
            total_input: input.len(),
            ..Default::default()
        };

        // The pending set is computed once, here. `dispatched` also swallows
        // duplicate ids inside the input itself, so no id is ever submitted
        // twice.
        let mut pending = Vec::new();
        for record in input {
            if dispatched.insert(record.id) {
                pending.push(record);
            }
        }
        stats.already_processed = stats.total_input - pending.len();

        info!(
            total = stats.total_input,
            already_processed = stats.already_processed,
            pending = pending.len(),
            "computed pending set"
        );

        if pending.is_empty() {
            info!("no new applications to process");
            return Ok(stats);
        }

        let semaphore = Arc::new(Semaphore::new(self.max_in_flight));
        let mut tasks = JoinSet::new();
        let mut task_owner: HashMap<tokio::task::Id, u64> = HashMap::new();

        for record in pending {
            let source = Arc::clone(&self.source);
            let analyzer = Arc::clone(&self.analyzer);
            let semaphore = Arc::clone(&semaphore);
            let applicant_id = record.id;

            let handle = tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("semaphore closed while tasks still pending");
                process_record(source.as_ref(), analyzer.as_ref(), record).await
            });
            task_owner.insert(handle.id(), applicant_id);
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((task_id, record)) => {
                    task_owner.remove(&task_id);
                    if record.ai_data.is_some() {
                        stats.enriched += 1;
                    } else if record.analysis_error.is_some() {
                        stats.errored += 1;
                    } else {
                        stats.no_resume += 1;
                    }
                    processed.push(record);
                    // Persist before accepting the next completion. If this
                    // fails the run aborts: carrying on would lose finished
                    // work without anyone noticing.
                    self.store.save(&processed)?;
                }
                Err(join_error) => {
                    let applicant_id = task_owner.remove(&join_error.id());
                    stats.faulted += 1;
                    error!(
                        applicant_id = ?applicant_id,
                        error = %join_error,
                        "processing task crashed; continuing with remaining applicants"
                    );
                }
            }
        }

        info!(
            enriched = stats.enriched,
            errored = stats.errored,
            no_resume = stats.no_resume,
            faulted = stats.faulted,
            "pipeline run complete"
        );

        Ok(stats)
    }
}
