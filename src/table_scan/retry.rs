use crate::db_types::{FetchedBatch, RowStore, Statement};
use crate::error::StoreError;
use async_trait::async_trait;
use std::time::Duration;

pub const QUERY_RETRY_BACKOFF: Duration = Duration::from_secs(5);

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

enum FetchState {
    Query,
    Backoff(StoreError),
    Done(FetchedBatch),
}

/// Fetches one page, retrying the same statement after a fixed backoff for as
/// long as the store keeps failing.
///
/// Returns the batch and the number of failed attempts before it.
pub async fn fetch_with_retry(
    store: &dyn RowStore,
    statement: &Statement,
    sleeper: &dyn Sleeper,
    backoff: Duration,
    label: &str,
) -> (FetchedBatch, u64) {
    let mut failures = 0u64;
    let mut state = FetchState::Query;

    loop {
        state = match state {
            FetchState::Query => match store.fetch(statement).await {
                Ok(batch) => FetchState::Done(batch),
                Err(error) => FetchState::Backoff(error),
            },
            FetchState::Backoff(error) => {
                failures += 1;
                log::warn!(
                    "[{}] query err: {}, retrying in {:?} (attempt {})",
                    label,
                    error,
                    backoff,
                    failures
                );
                sleeper.sleep(backoff).await;
                FetchState::Query
            }
            FetchState::Done(batch) => return (batch, failures),
        };
    }
}
