use crate::db_types::{RowStore, Statement};
use std::time::Duration;

pub const UPDATE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Logged only.
    DryRun,
    Applied { rows_affected: u64 },
    /// Logged; the row counts as attempted but unconfirmed.
    Failed,
}

/// Applies (or, in dry-run mode, logs) one row's UPDATE. Failures never
/// propagate.
pub async fn apply_update(
    store: &dyn RowStore,
    statement: &Statement,
    dry_run: bool,
    timeout: Duration,
    label: &str,
) -> UpdateOutcome {
    if dry_run {
        log::info!("[{}] [dry-run] {}", label, statement);
        return UpdateOutcome::DryRun;
    }

    match store.execute(statement, timeout).await {
        Ok(rows_affected) => {
            if rows_affected == 0 {
                log::debug!("[{}] update matched no rows -- {}", label, statement);
            }
            UpdateOutcome::Applied { rows_affected }
        }
        Err(error) => {
            log::warn!("[{}] update err: {} -- sql={}", label, error, statement);
            UpdateOutcome::Failed
        }
    }
}
