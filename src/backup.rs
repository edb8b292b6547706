//! # Backup Manager
//!
//! Snapshots the candidate set before anything is mutated.
//!
//! Each file is copied byte-for-byte to
//! `<backup parent>/assets_backup_<timestamp>/<path relative to root>` with
//! its access/modification times restored. Copies are independent: a
//! failure is logged and counted, never fatal. The snapshot is write-only
//! from this tool's point of view; it exists for manual recovery.

use crate::atomic::{restore_times, FileStamps};
use crate::error::OptimizeError;
use crate::file_manager::AssetPath;
use crate::optimizer::path_resolver::PathResolver;
use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Outcome of a backup pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct BackupReport {
    /// Snapshot directory, `None` when nothing was backed up
    pub dir: Option<PathBuf>,
    pub succeeded: usize,
    pub failed: usize,
}

pub struct BackupManager {
    root: PathBuf,
    parent: PathBuf,
}

impl BackupManager {
    pub fn new(root: &Path, parent: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            parent: parent.to_path_buf(),
        }
    }

    /// Copy every file into a fresh timestamped snapshot directory
    pub async fn backup(&self, files: &[AssetPath]) -> BackupReport {
        if files.is_empty() {
            warn!("No files to back up");
            return BackupReport::default();
        }

        let dir = self
            .parent
            .join(PathResolver::backup_dir_name(Utc::now()));
        info!("Backing up {} files to {}", files.len(), dir.display());

        let mut report = BackupReport {
            dir: Some(dir.clone()),
            ..Default::default()
        };

        for file in files {
            let copied = match PathResolver::backup_destination(&self.root, &dir, &file.path) {
                Ok(dest) => copy_preserving_times(&file.path, &dest).await,
                Err(e) => Err(e),
            };
            match copied {
                Ok(()) => report.succeeded += 1,
                Err(e) => {
                    error!("Backup failed for {}: {}", file.path.display(), e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "Backup complete: {} ok, {} failed",
            report.succeeded, report.failed
        );
        report
    }
}

async fn copy_preserving_times(src: &Path, dest: &Path) -> Result<(), OptimizeError> {
    let metadata = tokio::fs::metadata(src).await?;
    PathResolver::ensure_parent_dirs(dest).await?;
    tokio::fs::copy(src, dest).await?;
    restore_times(dest, &FileStamps::from(&metadata));
    Ok(())
}
