// =====================================================
// TABLE SCAN ENGINE
// Batched scan + conditional update of one table, in keyset
// (primary / composite key) or offset (no usable key) mode
// =====================================================

pub mod executor;
pub mod keyset;
pub mod offset;
pub mod retry;
pub mod statement;
pub mod transform;

use crate::convert::{ConversionOracle, Variant};
use crate::db_types::{RowStore, Statement};
use crate::error::TradifyError;
use crate::progress::ProgressSink;
use crate::sql_utils::position_ignore_case;
use crate::throttle::RateLimiter;
use executor::{apply_update, UpdateOutcome, UPDATE_TIMEOUT};
use keyset::KeysetOutcome;
use retry::{fetch_with_retry, Sleeper, TokioSleeper, QUERY_RETRY_BACKOFF};
use statement::{build_update, UpdateTarget};
use std::fmt;
use std::time::Duration;
use transform::transform_row;

/// Fully resolved settings for one table run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    pub table: String,
    /// Empty selects offset mode.
    pub key_columns: Vec<String>,
    /// Only consulted in offset mode.
    pub identify_by: Vec<String>,
    pub columns: Vec<String>,
    pub variant: String,
    pub batch_size: usize,
    pub dry_run: bool,
    /// 0 = unlimited.
    pub rows_per_second: u32,
}

impl ScanConfig {
    pub fn mode(&self) -> ScanMode {
        if self.key_columns.is_empty() {
            ScanMode::Offset
        } else {
            ScanMode::Keyset
        }
    }

    pub fn validate(&self) -> Result<(), TradifyError> {
        let invalid = |reason: &str| TradifyError::InvalidScanConfig {
            table: self.table.clone(),
            reason: reason.to_string(),
        };

        if self.table.trim().is_empty() {
            return Err(invalid("table name is empty"));
        }
        if self.columns.is_empty() {
            return Err(invalid("at least one column to convert is required"));
        }
        if self.batch_size == 0 {
            return Err(invalid("batch size must be greater than zero"));
        }
        let all_names = self
            .key_columns
            .iter()
            .chain(&self.identify_by)
            .chain(&self.columns);
        for name in all_names {
            if name.trim().is_empty() {
                return Err(invalid("column names cannot be blank"));
            }
        }
        self.variant
            .parse::<Variant>()
            .map_err(|error| invalid(&error.to_string()))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    #[default]
    Keyset,
    Offset,
}

impl ScanMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanMode::Keyset => "keyset",
            ScanMode::Offset => "offset",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub table: String,
    pub mode: ScanMode,
    /// Keyset paging stalled and the table was rescanned in offset mode.
    pub fell_back: bool,
    /// After a fallback, `rows_scanned`, `rows_skipped` and
    /// `conversion_errors` describe the offset rescan only, which covers the
    /// whole table.
    pub rows_scanned: u64,
    pub rows_changed: u64,
    pub updates_applied: u64,
    /// Applied updates that matched no row.
    pub updates_unmatched: u64,
    pub updates_failed: u64,
    pub rows_skipped: u64,
    pub conversion_errors: u64,
    pub query_retries: u64,
}

impl fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mode={}{} scanned={} changed={} applied={} unmatched={} failed={} skipped={} convert_errors={} retries={}",
            self.mode.as_str(),
            if self.fell_back { "(fallback)" } else { "" },
            self.rows_scanned,
            self.rows_changed,
            self.updates_applied,
            self.updates_unmatched,
            self.updates_failed,
            self.rows_skipped,
            self.conversion_errors,
            self.query_retries
        )
    }
}

/// One table run. Strictly sequential: a batch is fetched, converted and
/// written before the next one is fetched.
pub struct TableScan<'a> {
    config: &'a ScanConfig,
    store: &'a dyn RowStore,
    oracle: &'a dyn ConversionOracle,
    progress: &'a dyn ProgressSink,
    sleeper: &'a dyn Sleeper,
    limiter: RateLimiter,
    backoff: Duration,
    update_timeout: Duration,
    total_known: bool,
    summary: ScanSummary,
}

impl<'a> TableScan<'a> {
    pub fn new(
        config: &'a ScanConfig,
        store: &'a dyn RowStore,
        oracle: &'a dyn ConversionOracle,
        progress: &'a dyn ProgressSink,
    ) -> Self {
        Self {
            config,
            store,
            oracle,
            progress,
            sleeper: &TokioSleeper,
            limiter: RateLimiter::per_second(config.rows_per_second),
            backoff: QUERY_RETRY_BACKOFF,
            update_timeout: UPDATE_TIMEOUT,
            total_known: false,
            summary: ScanSummary {
                table: config.table.clone(),
                mode: config.mode(),
                ..ScanSummary::default()
            },
        }
    }

    pub fn with_sleeper(mut self, sleeper: &'a dyn Sleeper) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub async fn run(mut self) -> Result<ScanSummary, TradifyError> {
        let config = self.config;
        config.validate()?;

        let table_columns = self
            .store
            .table_columns(&config.table)
            .await
            .map_err(|source| TradifyError::Introspection {
                table: config.table.clone(),
                source,
            })?;
        if table_columns.is_empty() {
            return Err(TradifyError::NoColumns(config.table.clone()));
        }
        let referenced = config
            .key_columns
            .iter()
            .chain(&config.identify_by)
            .chain(&config.columns);
        for column in referenced {
            if position_ignore_case(&table_columns, column).is_none() {
                return Err(TradifyError::UnknownColumn {
                    table: config.table.clone(),
                    column: column.clone(),
                });
            }
        }

        match self.store.count_rows(&config.table).await {
            Ok(total) => {
                self.progress.set_total(total, false);
                self.total_known = true;
            }
            Err(error) => {
                log::warn!(
                    "[{}] row count unavailable, growing total per batch: {}",
                    config.table,
                    error
                );
            }
        }

        match config.mode() {
            ScanMode::Keyset => {
                log::info!(
                    "[{}] start (keyset) pk={:?} cols={:?}",
                    config.table,
                    config.key_columns,
                    config.columns
                );
                if let KeysetOutcome::Unreliable(stall) = keyset::run(&mut self).await {
                    log::warn!(
                        "[{}] keyset paging stopped ({}); rescanning with offset paging",
                        config.table,
                        stall
                    );
                    self.summary.fell_back = true;
                    self.summary.rows_scanned = 0;
                    self.summary.rows_skipped = 0;
                    self.summary.conversion_errors = 0;
                    self.total_known = false;
                    offset::run(&mut self, &table_columns, &config.key_columns).await;
                }
            }
            ScanMode::Offset => {
                log::info!(
                    "[{}] start (offset) cols={:?} identify_by={:?}",
                    config.table,
                    config.columns,
                    config.identify_by
                );
                if config.identify_by.is_empty() {
                    log::warn!(
                        "[{}] no key or identify_by columns; updates match the whole row with LIMIT 1",
                        config.table
                    );
                }
                offset::run(&mut self, &table_columns, &config.identify_by).await;
            }
        }

        self.progress.set_total(self.progress.position(), true);
        log::info!("[{}] done (no more rows): {}", config.table, self.summary);
        Ok(self.summary)
    }

    /// Reads one page. `seen_skipped` undecodable rows at its head were
    /// already counted on the previous page and are not counted again.
    async fn fetch_page(
        &mut self,
        statement: &Statement,
        seen_skipped: usize,
    ) -> crate::db_types::FetchedBatch {
        let (batch, failures) = fetch_with_retry(
            self.store,
            statement,
            self.sleeper,
            self.backoff,
            &self.config.table,
        )
        .await;
        self.summary.query_retries += failures;

        let repeated = seen_skipped.min(batch.skipped);
        let fresh = batch.skipped - repeated;
        if fresh > 0 {
            log::warn!("[{}] skipped {} undecodable row(s)", self.config.table, fresh);
            self.summary.rows_skipped += fresh as u64;
        }
        self.note_batch(batch.returned() - repeated);
        batch
    }

    /// Grows an unknown progress total by the new rows just read.
    fn note_batch(&mut self, fresh_rows: usize) {
        if !self.total_known && fresh_rows > 0 {
            self.progress
                .set_total(self.progress.position() + fresh_rows as u64, false);
        }
    }

    async fn process_row<'c>(
        &mut self,
        cells: impl IntoIterator<Item = (&'c str, Option<&'c str>)>,
        target: UpdateTarget<'_>,
    ) {
        let config = self.config;
        self.limiter.acquire().await;
        self.summary.rows_scanned += 1;

        let transform = transform_row(self.oracle, &config.variant, cells, &config.table);
        self.summary.conversion_errors += transform.conversion_errors as u64;

        let whole_row = matches!(target, UpdateTarget::WholeRow { .. });
        if let Some(statement) = build_update(&config.table, &transform.changed, target) {
            self.summary.rows_changed += 1;
            let outcome = apply_update(
                self.store,
                &statement,
                config.dry_run,
                self.update_timeout,
                &config.table,
            )
            .await;
            match outcome {
                UpdateOutcome::Applied { rows_affected } => {
                    self.summary.updates_applied += 1;
                    if rows_affected == 0 {
                        self.summary.updates_unmatched += 1;
                        // Whole-row predicates compare every decoded cell, so a
                        // value that does not round-trip as text misses the row.
                        if whole_row {
                            log::warn!(
                                "[{}] whole-row update matched no rows -- {}",
                                config.table,
                                statement
                            );
                        }
                    }
                }
                UpdateOutcome::Failed => self.summary.updates_failed += 1,
                UpdateOutcome::DryRun => {}
            }
        }

        self.progress.inc(1);
    }
}

/// Runs one table with the default tokio sleeper.
pub async fn run_table_scan(
    config: &ScanConfig,
    store: &dyn RowStore,
    oracle: &dyn ConversionOracle,
    progress: &dyn ProgressSink,
) -> Result<ScanSummary, TradifyError> {
    TableScan::new(config, store, oracle, progress).run().await
}
