//! Category harvest loop
//!
//! Walks category ids `0..categories` in order, resolves each through the
//! category cache, accumulates the records and periodically rewrites the
//! CSV output with everything gathered so far.

use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

use crate::cache::{CategoryCache, Resolution, StoreError};
use crate::data::{Column, SeriesRecord, SeriesSource};
use crate::export;
use crate::throttle::Throttle;

/// Errors that end a harvest. Per-category fetch failures are not among
/// them.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The CSV output could not be written
    #[error("Failed to write output: {0}")]
    Output(#[from] io::Error),
}

/// Settings for one harvest run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestConfig {
    /// Upper bound (exclusive) of the category id range
    pub categories: u32,
    /// Rewrite the output every this many categories; 0 disables
    pub flush_every: u32,
    /// CSV output path
    pub output: PathBuf,
    /// Projected columns, in output order
    pub columns: Vec<Column>,
    /// Emit a leading row-index column
    pub write_index: bool,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            categories: 100,
            flush_every: 100,
            output: PathBuf::from("series.csv"),
            columns: Column::all(),
            write_index: false,
        }
    }
}

/// Counters collected over a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    /// Categories resolved
    pub categories: u32,
    /// Served from the store
    pub cached: u32,
    /// Fetched from the network
    pub fetched: u32,
    /// Fetches that failed
    pub failed: u32,
    /// Rows in the final CSV
    pub rows: usize,
}

/// Drives the category loop and owns the accumulated table
pub struct Harvester<'a, T, S: ?Sized> {
    cache: CategoryCache<'a, T>,
    source: &'a S,
    config: HarvestConfig,
    records: Vec<SeriesRecord>,
    next_category: u32,
    summary: HarvestSummary,
}

impl<'a, T, S> Harvester<'a, T, S>
where
    T: Throttle,
    S: SeriesSource + ?Sized,
{
    pub fn new(cache: CategoryCache<'a, T>, source: &'a S, config: HarvestConfig) -> Self {
        Self {
            cache,
            source,
            config,
            records: Vec::new(),
            next_category: 0,
            summary: HarvestSummary::default(),
        }
    }

    /// Records accumulated so far, in category order
    pub fn records(&self) -> &[SeriesRecord] {
        &self.records
    }

    pub fn cache(&self) -> &CategoryCache<'a, T> {
        &self.cache
    }

    /// Resolves every remaining category in the range
    ///
    /// Progress is kept on `self`, so if this future is dropped part-way
    /// (e.g. on interrupt) `finish` still writes what was gathered.
    pub async fn run(&mut self) -> Result<(), HarvestError> {
        while self.next_category < self.config.categories {
            let category_id = self.next_category;
            debug!(accumulated = self.records.len(), "series list length");

            let resolution = self.cache.resolve(category_id, self.source).await?;
            self.accumulate(category_id, resolution);
            self.next_category += 1;

            let flush_every = self.config.flush_every;
            if flush_every > 0 && self.next_category % flush_every == 0 {
                self.write_output()?;
            }
        }
        Ok(())
    }

    /// Writes the final CSV and returns the run's counters
    pub fn finish(mut self) -> Result<HarvestSummary, HarvestError> {
        self.write_output()?;
        self.summary.rows = self.records.len();
        Ok(self.summary)
    }

    fn accumulate(&mut self, category_id: u32, resolution: Resolution) {
        self.summary.categories += 1;
        match &resolution {
            Resolution::Cached(records) => {
                self.summary.cached += 1;
                info!(category_id, count = records.len(), cached = true, "fetched series for category");
            }
            Resolution::Fetched(records) => {
                self.summary.fetched += 1;
                info!(category_id, count = records.len(), "fetched series for category");
            }
            Resolution::Failed(_) => self.summary.failed += 1,
        }
        self.records.extend(resolution.into_records());
    }

    fn write_output(&self) -> Result<(), HarvestError> {
        info!(
            rows = self.records.len(),
            path = %self.config.output.display(),
            "saving series to csv"
        );
        export::write_csv(
            &self.config.output,
            &self.records,
            &self.config.columns,
            self.config.write_index,
        )?;
        Ok(())
    }
}

/// Runs a full harvest to completion and writes the final output
pub async fn harvest<T, S>(
    cache: CategoryCache<'_, T>,
    source: &S,
    config: HarvestConfig,
) -> Result<HarvestSummary, HarvestError>
where
    T: Throttle,
    S: SeriesSource + ?Sized,
{
    let mut harvester = Harvester::new(cache, source, config);
    harvester.run().await?;
    harvester.finish()
}
