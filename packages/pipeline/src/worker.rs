//! Fixed-size worker pool over a shared job queue.
//!
//! `concurrency` tokio tasks compete for [`RowJob`]s from one queue
//! (consumer-competes — no job is processed twice) and emit exactly one
//! [`RowResult`] per job into an unbounded channel. Each worker owns a
//! sender clone, so the channel closes exactly when the last worker
//! exits; the collector needs no separate "all done" signal.
//!
//! Rate limiting is per worker: a fixed pacing delay is slept before
//! every upstream call (cache hits skip it), bounding the aggregate
//! request rate to roughly `workers / delay` without a global token
//! bucket.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use placemark_geocoder::cache::ResolutionCache;
use placemark_geocoder::registry::ServiceConfig;
use placemark_geocoder::{CoordinatePair, ResolvedLocation, nominatim};
use tokio::sync::mpsc;

use crate::coords;

/// One unit of work: a data row and its raw coordinate cell.
///
/// `row` is the absolute position in the full table (0 is the header),
/// preserved across batch partitioning so results land on the correct
/// destination row regardless of which batch produced them.
#[derive(Debug, Clone)]
pub struct RowJob {
    /// Absolute row index in the table.
    pub row: usize,
    /// Raw coordinate cell text.
    pub raw: String,
}

/// The outcome for one row. Produced exactly once per [`RowJob`].
#[derive(Debug, Clone)]
pub enum RowResult {
    /// The row was not resolved; `reason` is reported, the run goes on.
    Skipped {
        /// Absolute row index.
        row: usize,
        /// Why the row was skipped.
        reason: String,
    },
    /// The row resolved to a location.
    Resolved {
        /// Absolute row index.
        row: usize,
        /// The resolved location.
        location: ResolvedLocation,
        /// The parsed coordinates, for reporting.
        coords: CoordinatePair,
    },
}

impl RowResult {
    /// The absolute row index this result belongs to.
    #[must_use]
    pub const fn row(&self) -> usize {
        match self {
            Self::Skipped { row, .. } | Self::Resolved { row, .. } => *row,
        }
    }
}

/// Spawns the worker pool and returns the result stream.
///
/// Results arrive in completion order, not job order; every result
/// carries its absolute row index so application is order-independent.
pub fn spawn_pool(
    jobs: Vec<RowJob>,
    workers: usize,
    request_delay: Duration,
    client: reqwest::Client,
    config: Arc<ServiceConfig>,
    cache: Arc<ResolutionCache>,
) -> mpsc::UnboundedReceiver<RowResult> {
    let (tx, rx) = mpsc::unbounded_channel();
    let queue = Arc::new(Mutex::new(VecDeque::from(jobs)));

    for _ in 0..workers {
        let tx = tx.clone();
        let queue = Arc::clone(&queue);
        let client = client.clone();
        let config = Arc::clone(&config);
        let cache = Arc::clone(&cache);

        tokio::spawn(async move {
            loop {
                let job = queue
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .pop_front();
                let Some(job) = job else { break };

                let result = process_job(&job, request_delay, &client, &config, &cache).await;
                if tx.send(result).is_err() {
                    // Receiver dropped; no point finishing the queue.
                    break;
                }
            }
        });
    }

    rx
}

/// Resolves one row: parse, cache lookup, then (on miss) a paced
/// upstream call.
async fn process_job(
    job: &RowJob,
    request_delay: Duration,
    client: &reqwest::Client,
    config: &ServiceConfig,
    cache: &ResolutionCache,
) -> RowResult {
    let pair = match coords::parse_coordinates(&job.raw) {
        Ok(pair) => pair,
        Err(e) => {
            return RowResult::Skipped {
                row: job.row,
                reason: e.to_string(),
            };
        }
    };

    if let Some(location) = cache.get(pair) {
        // Cache hit: no network call, no pacing delay.
        return RowResult::Resolved {
            row: job.row,
            location,
            coords: pair,
        };
    }

    if !request_delay.is_zero() {
        tokio::time::sleep(request_delay).await;
    }

    match nominatim::reverse_geocode(client, config, pair).await {
        Ok(location) => {
            cache.put(pair, location.clone());
            RowResult::Resolved {
                row: job.row,
                location,
                coords: pair,
            }
        }
        Err(e) => RowResult::Skipped {
            row: job.row,
            reason: format!("geocode error: {e}"),
        },
    }
}
