// =====================================================
// DIRECTORY REWRITE
// Walks a tree and converts matching text files in place
// =====================================================

use crate::config::ConfigError;
use crate::convert::{ConversionOracle, Variant};
use crate::error::TradifyError;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

pub const DEFAULT_WORKERS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileJob {
    pub root: PathBuf,
    /// Empty means every file.
    pub extensions: Vec<String>,
    pub variant: String,
    pub backup: bool,
    pub dry_run: bool,
    pub workers: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Unchanged,
    /// Dry run: the file would have been rewritten.
    WouldChange,
    Rewritten { backed_up: bool },
    SkippedNotUtf8,
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileSummary {
    pub scanned: u64,
    pub changed: u64,
    pub written: u64,
    pub backed_up: u64,
    pub skipped_not_utf8: u64,
    pub failed: u64,
}

impl FileSummary {
    fn record(&mut self, outcome: FileOutcome) {
        self.scanned += 1;
        match outcome {
            FileOutcome::Unchanged => {}
            FileOutcome::WouldChange => self.changed += 1,
            FileOutcome::Rewritten { backed_up } => {
                self.changed += 1;
                self.written += 1;
                if backed_up {
                    self.backed_up += 1;
                }
            }
            FileOutcome::SkippedNotUtf8 => self.skipped_not_utf8 += 1,
            FileOutcome::Failed => self.failed += 1,
        }
    }
}

impl fmt::Display for FileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scanned={} changed={} written={} backups={} not_utf8={} failed={}",
            self.scanned,
            self.changed,
            self.written,
            self.backed_up,
            self.skipped_not_utf8,
            self.failed
        )
    }
}

/// Lower-cases extensions and gives each a leading dot; blanks are dropped.
pub fn normalize_extensions(extensions: &[String]) -> HashSet<String> {
    extensions
        .iter()
        .map(|ext| ext.trim().to_lowercase())
        .filter(|ext| !ext.is_empty())
        .map(|ext| if ext.starts_with('.') { ext } else { format!(".{}", ext) })
        .collect()
}

fn extension_matches(path: &Path, extensions: &HashSet<String>) -> bool {
    if extensions.is_empty() {
        return true;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.contains(&format!(".{}", ext.to_lowercase())))
        .unwrap_or(false)
}

/// Files under `root` accepted by the extension filter. Unreadable entries are
/// logged and skipped.
pub fn collect_files(root: &Path, extensions: &HashSet<String>) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("[file] walk error: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| extension_matches(path, extensions))
        .collect()
}

/// Reads, converts and (unless dry run) rewrites one file.
pub fn process_file(
    path: &Path,
    oracle: &dyn ConversionOracle,
    variant: &str,
    backup: bool,
    dry_run: bool,
) -> FileOutcome {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("[file] read failed {}: {}", path.display(), e);
            return FileOutcome::Failed;
        }
    };
    let Ok(text) = std::str::from_utf8(&bytes) else {
        log::debug!("[file] skipping non UTF-8 file {}", path.display());
        return FileOutcome::SkippedNotUtf8;
    };

    let conversion = match oracle.convert(variant, text) {
        Ok(conversion) => conversion,
        Err(e) => {
            log::warn!("[file] convert failed {}: {}", path.display(), e);
            return FileOutcome::Failed;
        }
    };
    if !conversion.changed {
        return FileOutcome::Unchanged;
    }

    if dry_run {
        log::info!("[file] [dry-run] would rewrite {}", path.display());
        return FileOutcome::WouldChange;
    }

    if backup {
        let mut backup_path = path.as_os_str().to_owned();
        backup_path.push(".bak");
        if let Err(e) = std::fs::write(&backup_path, &bytes) {
            log::warn!(
                "[file] backup failed {}: {}",
                Path::new(&backup_path).display(),
                e
            );
            return FileOutcome::Failed;
        }
    }

    if let Err(e) = std::fs::write(path, conversion.text.as_bytes()) {
        log::warn!("[file] write failed {}: {}", path.display(), e);
        return FileOutcome::Failed;
    }
    log::info!("[file] converted {}", path.display());
    FileOutcome::Rewritten { backed_up: backup }
}

/// Converts every matching file below `job.root` with `job.workers` files in
/// flight. Per-file failures are logged and counted, never returned.
pub async fn run_file_job(
    job: &FileJob,
    oracle: Arc<dyn ConversionOracle>,
) -> Result<FileSummary, TradifyError> {
    job.variant
        .parse::<Variant>()
        .map_err(|e| ConfigError::Invalid {
            origin: "file".to_string(),
            reason: e.to_string(),
        })?;
    let metadata = std::fs::metadata(&job.root).map_err(|source| ConfigError::Read {
        path: job.root.clone(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(ConfigError::Invalid {
            origin: "file".to_string(),
            reason: format!("{} is not a directory", job.root.display()),
        }
        .into());
    }

    let extensions = normalize_extensions(&job.extensions);
    log::info!(
        "[file] scanning {} (ext={:?}, to={}, dry_run={}, backup={}, workers={})",
        job.root.display(),
        extensions,
        job.variant,
        job.dry_run,
        job.backup,
        job.workers
    );

    let root = job.root.clone();
    let files = tokio::task::spawn_blocking(move || collect_files(&root, &extensions))
        .await
        .map_err(|e| TradifyError::TaskFailed(e.to_string()))?;

    let outcomes = stream::iter(files)
        .map(|path| {
            let oracle = Arc::clone(&oracle);
            let variant = job.variant.clone();
            let (backup, dry_run) = (job.backup, job.dry_run);
            async move {
                let shown = path.display().to_string();
                match tokio::task::spawn_blocking(move || {
                    process_file(&path, oracle.as_ref(), &variant, backup, dry_run)
                })
                .await
                {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        log::warn!("[file] worker failed on {}: {}", shown, e);
                        FileOutcome::Failed
                    }
                }
            }
        })
        .buffer_unordered(job.workers.max(1))
        .collect::<Vec<FileOutcome>>()
        .await;

    let mut summary = FileSummary::default();
    for outcome in outcomes {
        summary.record(outcome);
    }
    log::info!("[file] done: {}", summary);
    Ok(summary)
}
