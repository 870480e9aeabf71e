// =====================================================
// MULTI-TABLE RUNNER
// One pool + one scan per table, bounded by tables_parallel
// =====================================================

use crate::config::{load_file_config, Defaults, MySqlJob};
use crate::convert::ZhOracle;
use crate::error::TradifyError;
use crate::mysql::{create_pool, ping, redact, ConnectionSettings, MySqlStore};
use crate::progress::LogProgress;
use crate::table_scan::{run_table_scan, ScanConfig, ScanSummary};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Opens a dedicated pool for `scan`, checks it and runs the table to the end.
pub async fn run_table(
    connection: ConnectionSettings,
    scan: ScanConfig,
) -> Result<ScanSummary, TradifyError> {
    log::info!(
        "[{}] connecting to {} (max_open={}, max_idle={})",
        scan.table,
        redact(&connection.dsn),
        connection.max_open,
        connection.max_idle
    );
    let pool = create_pool(&connection).await?;
    ping(&pool).await?;

    let store = MySqlStore::new(pool);
    let progress = LogProgress::new(scan.table.clone());
    let result = run_table_scan(&scan, &store, &ZhOracle, &progress).await;
    store.pool().close().await;
    result
}

/// Runs every scan with at most `tables_parallel` in flight. All tables run to
/// completion; the first failure (in table order) becomes the result.
pub async fn run_tables<F, Fut>(
    scans: Vec<ScanConfig>,
    tables_parallel: usize,
    run: F,
) -> Result<Vec<ScanSummary>, TradifyError>
where
    F: Fn(ScanConfig) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ScanSummary, TradifyError>> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(tables_parallel.max(1)));
    let run = Arc::new(run);
    let mut handles = Vec::with_capacity(scans.len());

    for scan in scans {
        let semaphore = Arc::clone(&semaphore);
        let run = Arc::clone(&run);
        let table = scan.table.clone();
        let handle = tokio::spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| TradifyError::TaskFailed(e.to_string()))?;
            (run.as_ref())(scan).await
        });
        handles.push((table, handle));
    }

    let mut summaries = Vec::with_capacity(handles.len());
    let mut first_error = None;
    for (table, handle) in handles {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => Err(TradifyError::TaskFailed(e.to_string())),
        };
        match outcome {
            Ok(summary) => summaries.push(summary),
            Err(error) => {
                log::error!("[{}] failed: {}", table, error);
                if first_error.is_none() {
                    first_error = Some(TradifyError::Table {
                        table,
                        source: Box::new(error),
                    });
                }
            }
        }
    }

    match first_error {
        Some(error) => Err(error),
        None => Ok(summaries),
    }
}

pub async fn run_job(job: MySqlJob) -> Result<Vec<ScanSummary>, TradifyError> {
    log::info!(
        "[mysql] {}: {} table(s), tables_parallel={}",
        job.origin,
        job.scans.len(),
        job.tables_parallel
    );
    let connection = job.connection;
    run_tables(job.scans, job.tables_parallel, move |scan| {
        run_table(connection.clone(), scan)
    })
    .await
}

/// Runs config files one after another, stopping at the first failing file.
pub async fn run_config_files(paths: Vec<PathBuf>) -> Result<(), TradifyError> {
    let defaults = Defaults::default();
    for path in paths {
        let origin = path.display().to_string();
        let job = load_file_config(&path)?.resolve(&defaults, &origin)?;
        run_job(job).await?;
    }
    Ok(())
}
