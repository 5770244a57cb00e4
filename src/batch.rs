//! Batched Art Generation
//!
//! Art for figures comes from an external generator. Requests are chunked into
//! fixed-size batches and handed to a bounded pool of worker threads. Each
//! batch is retried a fixed number of times with a fixed delay; a batch that
//! still fails, or does not report back in time, contributes no art. Results
//! are put back in batch order regardless of which worker finished first.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::merge::ArtLookup;
use crate::tactile::FigureArt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub batch_size: usize,
    pub max_workers: usize,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub batch_timeout_secs: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 4,
            max_workers: 8,
            max_retries: 3,
            retry_delay_ms: 2000,
            batch_timeout_secs: 120,
        }
    }
}

impl BatchConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn batch_timeout(&self) -> Duration {
        Duration::from_secs(self.batch_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtRequest {
    pub figure_id: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedArt {
    pub figure_id: String,
    pub art: FigureArt,
}

#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("Art service error: {0}")]
    Service(String),

    #[error("Art service returned no usable content: {0}")]
    EmptyResponse(String),
}

/// External producer of figure art.
pub trait ArtGenerator: Send + Sync {
    fn generate(&self, batch: &[ArtRequest]) -> Result<Vec<GeneratedArt>, GenerationError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum BatchFailure {
    RetriesExhausted { attempts: u32, last_error: String },
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedBatch {
    pub index: usize,
    pub figure_ids: Vec<String>,
    pub failure: BatchFailure,
}

#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Generated art in batch order, then generator order within a batch.
    pub art: Vec<GeneratedArt>,
    pub failed_batches: Vec<FailedBatch>,
}

impl BatchOutcome {
    pub fn into_lookup(self) -> ArtLookup {
        self.art.into_iter().map(|a| (a.figure_id, a.art)).collect()
    }
}

type BatchResult = Result<Vec<GeneratedArt>, BatchFailure>;

/// Run one batch with its retry budget.
fn run_with_retries(generator: &dyn ArtGenerator, index: usize, batch: &[ArtRequest], config: &BatchConfig) -> BatchResult {
    let attempts = config.max_retries + 1;
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        match generator.generate(batch) {
            Ok(art) => {
                debug!(batch = index, attempt, figures = art.len(), "art batch generated");
                return Ok(art);
            }
            Err(e) => {
                last_error = e.to_string();
                if attempt < attempts {
                    warn!(batch = index, attempt, error = %e, "art batch failed, retrying");
                    thread::sleep(config.retry_delay());
                }
            }
        }
    }

    Err(BatchFailure::RetriesExhausted { attempts, last_error })
}

/// Generate art for every request using a bounded worker pool.
pub fn generate_batched(
    generator: Arc<dyn ArtGenerator>,
    requests: Vec<ArtRequest>,
    config: &BatchConfig,
) -> BatchOutcome {
    let batch_size = config.batch_size.max(1);
    let batches: Vec<Vec<ArtRequest>> = requests.chunks(batch_size).map(<[ArtRequest]>::to_vec).collect();
    if batches.is_empty() {
        return BatchOutcome::default();
    }

    let workers = config.max_workers.max(1).min(batches.len());
    info!(batches = batches.len(), workers, "starting art generation");

    let (job_tx, job_rx) = mpsc::channel::<(usize, Vec<ArtRequest>)>();
    let job_rx = Arc::new(Mutex::new(job_rx));
    let (result_tx, result_rx) = mpsc::channel::<(usize, BatchResult)>();

    for (index, batch) in batches.iter().enumerate() {
        // Receiver is alive until the workers below exit.
        let _ = job_tx.send((index, batch.clone()));
    }
    drop(job_tx);

    for _ in 0..workers {
        let job_rx = Arc::clone(&job_rx);
        let result_tx = result_tx.clone();
        let generator = Arc::clone(&generator);
        let config = config.clone();
        thread::spawn(move || loop {
            let job = match job_rx.lock() {
                Ok(rx) => rx.recv(),
                Err(_) => break,
            };
            let Ok((index, batch)) = job else { break };
            let result = run_with_retries(generator.as_ref(), index, &batch, &config);
            if result_tx.send((index, result)).is_err() {
                break;
            }
        });
    }
    drop(result_tx);

    let mut results: BTreeMap<usize, BatchResult> = BTreeMap::new();
    while results.len() < batches.len() {
        match result_rx.recv_timeout(config.batch_timeout()) {
            Ok((index, result)) => {
                results.insert(index, result);
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                warn!(pending = batches.len() - results.len(), "art generation timed out");
                break;
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    let mut outcome = BatchOutcome::default();
    for (index, batch) in batches.iter().enumerate() {
        let result = results.remove(&index).unwrap_or(Err(BatchFailure::TimedOut));
        match result {
            Ok(art) => outcome.art.extend(art),
            Err(failure) => {
                warn!(batch = index, ?failure, "dropping art batch");
                outcome.failed_batches.push(FailedBatch {
                    index,
                    figure_ids: batch.iter().map(|r| r.figure_id.clone()).collect(),
                    failure,
                });
            }
        }
    }
    outcome
}
