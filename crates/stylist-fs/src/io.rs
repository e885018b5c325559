//! Atomic I/O operations with file locking

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use fs2::FileExt;

use crate::{Error, NormalizedPath, Result};

/// Retry policy for writes that may hit transient contention, such as a
/// cache file another process is replacing at the same moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobustnessConfig {
    /// Delay before the first retry
    pub initial_interval: Duration,
    /// Upper bound on a single delay
    pub max_interval: Duration,
    /// Total time budget across all attempts
    pub max_elapsed: Duration,
}

impl Default for RobustnessConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(25),
            max_interval: Duration::from_millis(250),
            max_elapsed: Duration::from_secs(2),
        }
    }
}

/// Sibling temp file for `target`; same directory so the final rename
/// stays on one filesystem.
fn temp_path_for(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}

/// Replace `path` with `content` in one step.
///
/// The bytes go to a locked temp file first and are renamed over the
/// target, so readers never observe a partial write. Missing parent
/// directories are created.
pub fn write_atomic(path: &NormalizedPath, content: &[u8]) -> Result<()> {
    let target = path.to_native();

    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let temp_path = temp_path_for(&target);
    let lock_failed = || Error::LockFailed { path: target.clone() };

    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file.lock_exclusive().map_err(|_| lock_failed())?;
    temp_file
        .write_all(content)
        .and_then(|()| temp_file.sync_all())
        .map_err(|e| Error::io(&temp_path, e))?;
    temp_file.unlock().map_err(|_| lock_failed())?;

    fs::rename(&temp_path, &target).map_err(|e| Error::io(&target, e))
}

/// [`write_atomic`] wrapped in a bounded exponential backoff.
///
/// Only errors reported as transient are retried; anything else fails on
/// the first attempt.
pub fn write_atomic_with_retry(
    path: &NormalizedPath,
    content: &[u8],
    robustness: RobustnessConfig,
) -> Result<()> {
    let policy = ExponentialBackoffBuilder::new()
        .with_initial_interval(robustness.initial_interval)
        .with_max_interval(robustness.max_interval)
        .with_max_elapsed_time(Some(robustness.max_elapsed))
        .build();

    let mut attempt = 0u32;
    backoff::retry(policy, || {
        attempt += 1;
        write_atomic(path, content).map_err(|e| {
            if e.is_transient() {
                tracing::debug!(%path, attempt, error = %e, "Transient write failure, retrying");
                backoff::Error::transient(e)
            } else {
                backoff::Error::permanent(e)
            }
        })
    })
    .map_err(|e| match e {
        backoff::Error::Permanent(err) => err,
        backoff::Error::Transient { err, .. } => err,
    })
}

pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native = path.to_native();
    fs::read_to_string(&native).map_err(|e| Error::io(&native, e))
}

/// Write a target file once, atomically and without retry.
pub fn write_text(path: &NormalizedPath, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes())
}
