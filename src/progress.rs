// =====================================================
// PROGRESS REPORTING
// =====================================================

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

const DEFAULT_REPORT_EVERY: u64 = 1_000;

/// Receives per-row increments and total-count hints from a scan.
///
/// Implementations must tolerate calls from several concurrent scans.
pub trait ProgressSink: Send + Sync {
    fn inc(&self, rows: u64);

    /// Sets the expected total; `complete` marks the run as finished.
    fn set_total(&self, total: u64, complete: bool);

    fn position(&self) -> u64;
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NoProgress {
    done: AtomicU64,
}

impl ProgressSink for NoProgress {
    fn inc(&self, rows: u64) {
        self.done.fetch_add(rows, Ordering::Relaxed);
    }

    fn set_total(&self, _total: u64, _complete: bool) {}

    fn position(&self) -> u64 {
        self.done.load(Ordering::Relaxed)
    }
}

/// Reports progress as log lines: one every `report_every` rows and one when
/// the run completes.
#[derive(Debug)]
pub struct LogProgress {
    label: String,
    report_every: u64,
    done: AtomicU64,
    total: AtomicU64,
    finished: AtomicBool,
    started: Instant,
}

impl LogProgress {
    pub fn new(label: impl Into<String>) -> Self {
        Self::with_interval(label, DEFAULT_REPORT_EVERY)
    }

    pub fn with_interval(label: impl Into<String>, report_every: u64) -> Self {
        Self {
            label: label.into(),
            report_every: report_every.max(1),
            done: AtomicU64::new(0),
            total: AtomicU64::new(0),
            finished: AtomicBool::new(false),
            started: Instant::now(),
        }
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }

    fn render(&self, done: u64) -> String {
        let total = self.total();
        let percent = if total == 0 {
            100.0
        } else {
            (done as f64 / total as f64 * 100.0).min(100.0)
        };
        let elapsed = self.started.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 { done as f64 / elapsed } else { 0.0 };
        format!(
            "[{}] {}/{} ({:.1}%) {:.0} rows/s",
            self.label, done, total, percent, rate
        )
    }
}

impl ProgressSink for LogProgress {
    fn inc(&self, rows: u64) {
        let before = self.done.fetch_add(rows, Ordering::Relaxed);
        let after = before + rows;
        if before / self.report_every != after / self.report_every {
            log::info!("{}", self.render(after));
        }
    }

    fn set_total(&self, total: u64, complete: bool) {
        self.total.store(total, Ordering::Relaxed);
        if complete && !self.finished.swap(true, Ordering::Relaxed) {
            log::info!("{} complete", self.render(self.position()));
        }
    }

    fn position(&self) -> u64 {
        self.done.load(Ordering::Relaxed)
    }
}
