#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Concurrent geocode-resolution pipeline.
//!
//! Turns a column of raw `"lat,lng"` strings into resolved location
//! records through a fixed-size worker pool ([`worker`]), with a shared
//! in-memory resolution cache, and — for datasets above a size
//! threshold — sequential fixed-size batches, each checkpointed to disk
//! so partial work survives interruption.
//!
//! Failure policy: row-level failures (unparseable coordinates,
//! exhausted geocode retries) skip the row and never abort the run;
//! checkpoint write failures are logged and never abort the run; only
//! setup failures (no usable coordinate column, unreadable table) are
//! fatal.

pub mod coords;
pub mod progress;
pub mod worker;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use placemark_geocoder::cache::ResolutionCache;
use placemark_geocoder::registry::ServiceConfig;
use placemark_geocoder::{GeocodeError, nominatim};
use placemark_table::columns::{self, ResultColumns};
use placemark_table::{Sheet, TableError};
use thiserror::Error;

use crate::progress::ProgressCallback;
use crate::worker::{RowJob, RowResult};

/// Errors that abort a processing run. Everything here is a
/// setup-phase failure; once workers are running, failures are
/// row-local or batch-local and are reported instead of raised.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The table could not be read, or no coordinate column exists.
    #[error(transparent)]
    Table(#[from] TableError),

    /// The HTTP client could not be constructed.
    #[error(transparent)]
    Geocode(#[from] GeocodeError),
}

/// Pipeline tunables.
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    /// Concurrent workers per batch.
    pub workers: usize,
    /// Per-worker pacing delay before every upstream call.
    pub request_delay: Duration,
    /// Rows per batch in batched mode.
    pub batch_size: usize,
    /// Data-row count above which batched (checkpointed) mode kicks in.
    pub large_dataset_threshold: usize,
    /// Pause between batches.
    pub batch_pause: Duration,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            request_delay: Duration::from_millis(1500),
            batch_size: 1000,
            large_dataset_threshold: 100_000,
            batch_pause: Duration::from_millis(500),
        }
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessSummary {
    /// Rows that received a resolved location.
    pub resolved: u64,
    /// Rows skipped (empty/bad coordinates or exhausted geocoding).
    pub skipped: u64,
    /// Total data rows in the table.
    pub total_rows: u64,
}

/// Partitions the data-row range `[1, total_rows]` into contiguous
/// half-open `[start, end)` batches of `batch_size` (last truncated).
/// Batches are non-overlapping and cover the full range in order.
#[must_use]
pub fn batch_ranges(total_rows: usize, batch_size: usize) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    if batch_size == 0 {
        return ranges;
    }
    let mut start = 1;
    while start <= total_rows {
        let end = (start + batch_size).min(total_rows + 1);
        ranges.push((start, end));
        start = end;
    }
    ranges
}

/// One enrichment run over one sheet.
///
/// Owns the destination sheet and the resolution cache; the cache lives
/// exactly as long as the run and is never persisted.
pub struct Service {
    sheet: Sheet,
    cache: Arc<ResolutionCache>,
    service_config: Arc<ServiceConfig>,
    config: ProcessConfig,
}

impl Service {
    /// Creates a run over `sheet`.
    #[must_use]
    pub fn new(sheet: Sheet, service_config: ServiceConfig, config: ProcessConfig) -> Self {
        Self {
            sheet,
            cache: Arc::new(ResolutionCache::new()),
            service_config: Arc::new(service_config),
            config,
        }
    }

    /// The destination sheet (with any applied results).
    #[must_use]
    pub fn sheet(&self) -> &Sheet {
        &self.sheet
    }

    /// Resolves every data row and applies the results to the sheet.
    ///
    /// Small datasets (at or below the threshold) run as one worker-pool
    /// invocation. Larger ones run batch by batch, strictly
    /// sequentially, saving the sheet to `checkpoint_path` after each
    /// batch; a failed checkpoint write is logged and processing
    /// continues — only the durability of that checkpoint is lost.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError`] only for setup failures: a missing
    /// coordinate column or an unbuildable HTTP client. Row- and
    /// batch-level failures are counted in the summary instead.
    pub async fn process(
        &mut self,
        checkpoint_path: Option<&Path>,
        progress: Option<Arc<dyn ProgressCallback>>,
    ) -> Result<ProcessSummary, ProcessError> {
        let layout = columns::find_columns(self.sheet.rows())?;
        let result_columns = columns::ensure_result_columns(&mut self.sheet, layout);

        let total_rows = self.sheet.data_row_count();
        log::info!("Total rows to process: {total_rows}");

        let progress = progress.unwrap_or_else(progress::null_progress);
        progress.set_total(total_rows as u64);

        let client = nominatim::build_client(&self.service_config)?;

        let mut summary = ProcessSummary {
            total_rows: total_rows as u64,
            ..ProcessSummary::default()
        };

        if total_rows <= self.config.large_dataset_threshold {
            let jobs = self.jobs_for_range(1, total_rows + 1, layout.coordinates);
            self.run_batch(jobs, &client, result_columns, &mut summary, &progress)
                .await;
        } else {
            let ranges = batch_ranges(total_rows, self.config.batch_size);
            let total_batches = ranges.len();
            log::info!(
                "Large dataset detected. Processing in batches of {} rows...",
                self.config.batch_size
            );

            for (batch_num, (start, end)) in ranges.into_iter().enumerate() {
                log::info!(
                    "--- Processing batch {}/{total_batches} (rows {start}-{}) ---",
                    batch_num + 1,
                    end - 1
                );

                let jobs = self.jobs_for_range(start, end, layout.coordinates);
                self.run_batch(jobs, &client, result_columns, &mut summary, &progress)
                    .await;

                if let Some(path) = checkpoint_path {
                    match self.sheet.save(path) {
                        Ok(()) => log::info!(
                            "Progress saved: {}/{total_rows} rows processed ({:.1}%)",
                            summary.resolved + summary.skipped,
                            (summary.resolved + summary.skipped) as f64 / total_rows as f64 * 100.0
                        ),
                        // Non-fatal: the work already applied in memory
                        // is not lost, only this checkpoint's durability.
                        Err(e) => log::warn!("Could not save progress: {e}"),
                    }
                }

                tokio::time::sleep(self.config.batch_pause).await;
            }
        }

        progress.finish(format!("Resolved {} row(s)", summary.resolved));
        log::info!(
            "Processing complete: {} resolved, {} skipped",
            summary.resolved,
            summary.skipped
        );

        Ok(summary)
    }

    /// Builds jobs for the half-open absolute row range `[start, end)`.
    fn jobs_for_range(&self, start: usize, end: usize, coordinate_col: usize) -> Vec<RowJob> {
        self.sheet.rows()[start..end]
            .iter()
            .enumerate()
            .map(|(i, row)| RowJob {
                row: start + i,
                raw: row.get(coordinate_col).cloned().unwrap_or_default(),
            })
            .collect()
    }

    /// Runs one worker-pool invocation and applies its results as they
    /// arrive. The sheet is mutated only here, after collection —
    /// workers never touch it.
    async fn run_batch(
        &mut self,
        jobs: Vec<RowJob>,
        client: &reqwest::Client,
        result_columns: ResultColumns,
        summary: &mut ProcessSummary,
        progress: &Arc<dyn ProgressCallback>,
    ) {
        let mut results = worker::spawn_pool(
            jobs,
            self.config.workers,
            self.config.request_delay,
            client.clone(),
            Arc::clone(&self.service_config),
            Arc::clone(&self.cache),
        );

        while let Some(result) = results.recv().await {
            self.apply_result(&result, result_columns, summary);
            progress.inc(1);
        }
    }

    /// Applies one result to the destination sheet. `Skipped` writes
    /// nothing; applying the same result twice leaves identical cells.
    fn apply_result(
        &mut self,
        result: &RowResult,
        result_columns: ResultColumns,
        summary: &mut ProcessSummary,
    ) {
        match result {
            RowResult::Skipped { row, reason } => {
                summary.skipped += 1;
                log::debug!("Row {}: {reason}", row + 1);
            }
            RowResult::Resolved {
                row,
                location,
                coords,
            } => {
                self.sheet
                    .set_cell(*row, result_columns.address, &*location.full_address);
                self.sheet
                    .set_cell(*row, result_columns.district, &*location.district);
                self.sheet
                    .set_cell(*row, result_columns.province, &*location.province);
                summary.resolved += 1;
                log::debug!(
                    "Row {}: ({:.6}, {:.6}) -> {}",
                    row + 1,
                    coords.latitude,
                    coords.longitude,
                    location.full_address
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use placemark_geocoder::{CoordinatePair, ResolvedLocation};

    #[test]
    fn batch_ranges_cover_without_overlap() {
        let ranges = batch_ranges(250_000, 1000);
        assert_eq!(ranges.len(), 250);

        let mut expected_start = 1;
        for &(start, end) in &ranges {
            assert_eq!(start, expected_start);
            assert!(end > start);
            expected_start = end;
        }
        assert_eq!(expected_start, 250_001);
    }

    #[test]
    fn batch_ranges_truncate_the_last_batch() {
        let ranges = batch_ranges(2500, 1000);
        assert_eq!(ranges, vec![(1, 1001), (1001, 2001), (2001, 2501)]);
    }

    #[test]
    fn batch_ranges_handle_exact_multiples_and_empty() {
        assert_eq!(batch_ranges(2000, 1000), vec![(1, 1001), (1001, 2001)]);
        assert!(batch_ranges(0, 1000).is_empty());
    }

    fn test_service() -> Service {
        let sheet = Sheet::from_rows(vec![
            vec!["coords".to_string(), "Address".to_string()],
            vec!["13.75,100.50".to_string()],
        ])
        .unwrap();
        let config = ServiceConfig {
            name: "test".to_string(),
            base_url: "http://localhost".to_string(),
            user_agent: "test".to_string(),
            language: "en".to_string(),
            request_timeout_ms: 1,
            max_attempts: 1,
            backoff_base_ms: 0,
            rate_limit_penalty_ms: 0,
        };
        Service::new(sheet, config, ProcessConfig::default())
    }

    #[test]
    fn applying_a_result_twice_is_idempotent() {
        let mut service = test_service();
        let columns = ResultColumns {
            address: 1,
            district: 2,
            province: 3,
        };
        let result = RowResult::Resolved {
            row: 1,
            location: ResolvedLocation {
                full_address: "Bangkok, Thailand".to_string(),
                district: "Pathum Wan".to_string(),
                province: "Bangkok".to_string(),
            },
            coords: CoordinatePair {
                latitude: 13.75,
                longitude: 100.50,
            },
        };

        let mut summary = ProcessSummary::default();
        service.apply_result(&result, columns, &mut summary);
        let after_once = service.sheet().rows()[1].clone();

        service.apply_result(&result, columns, &mut summary);
        assert_eq!(service.sheet().rows()[1], after_once);
        assert_eq!(after_once[1], "Bangkok, Thailand");
        assert_eq!(after_once[2], "Pathum Wan");
        assert_eq!(after_once[3], "Bangkok");
    }

    #[test]
    fn skipped_results_write_nothing() {
        let mut service = test_service();
        let columns = ResultColumns {
            address: 1,
            district: 2,
            province: 3,
        };
        let mut summary = ProcessSummary::default();
        service.apply_result(
            &RowResult::Skipped {
                row: 1,
                reason: "empty coordinates".to_string(),
            },
            columns,
            &mut summary,
        );

        assert_eq!(service.sheet().rows()[1].len(), 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.resolved, 0);
    }
}
