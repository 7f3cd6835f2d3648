// ── Retention cleanup ──
//
// Removes dated run directories older than the retention window. Only the
// immediate children of the output root are considered; nothing below them
// is inspected, and plain files or symlinks are left alone.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{debug, info, warn};

use crate::error::CoreError;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// How long run directories are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    max_age_days: u32,
}

impl RetentionPolicy {
    /// `0` days would delete the directory just written, so it is refused.
    pub fn new(max_age_days: u32) -> Result<Self, CoreError> {
        if max_age_days == 0 {
            return Err(CoreError::Config {
                message: "retention days must be at least 1".into(),
            });
        }
        Ok(Self { max_age_days })
    }

    pub fn max_age_days(self) -> u32 {
        self.max_age_days
    }

    pub fn max_age(self) -> Duration {
        Duration::from_secs(u64::from(self.max_age_days) * SECS_PER_DAY)
    }
}

/// Remove subdirectories of `root` last modified before `now - max_age`.
///
/// `keep` is never removed, whatever its age. With `dry_run` nothing is
/// deleted and the would-be removals are returned. A missing `root` is not
/// an error. Failures on single entries are logged and skipped.
pub async fn clean(
    root: &Path,
    policy: RetentionPolicy,
    now: SystemTime,
    keep: Option<&Path>,
    dry_run: bool,
) -> Result<Vec<PathBuf>, CoreError> {
    let Some(cutoff) = now.checked_sub(policy.max_age()) else {
        return Ok(Vec::new());
    };

    let mut entries = match tokio::fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(root = %root.display(), "output root does not exist, nothing to clean");
            return Ok(Vec::new());
        }
        Err(e) => return Err(CoreError::io(root, e)),
    };

    let mut removed = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| CoreError::io(root, e))?
    {
        let path = entry.path();
        if keep.is_some_and(|k| k == path.as_path()) {
            continue;
        }

        // DirEntry metadata does not follow symlinks.
        let modified = match entry.metadata().await {
            Ok(meta) if meta.is_dir() => meta.modified(),
            Ok(_) => continue,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot inspect entry");
                continue;
            }
        };
        let modified = match modified {
            Ok(t) => t,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "no modification time");
                continue;
            }
        };

        if modified >= cutoff {
            continue;
        }

        if dry_run {
            info!(path = %path.display(), "would remove old backup");
            removed.push(path);
            continue;
        }

        info!(path = %path.display(), "removing old backup");
        match tokio::fs::remove_dir_all(&path).await {
            Ok(()) => removed.push(path),
            Err(e) => warn!(path = %path.display(), error = %e, "failed to remove old backup"),
        }
    }

    removed.sort();
    Ok(removed)
}
