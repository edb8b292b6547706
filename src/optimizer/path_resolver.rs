//! # Path Resolution Module
//!
//! Centralizza il calcolo dei path derivati: twin WebP, snapshot di backup
//! e destinazioni in mirror rispetto alla root.

use crate::error::OptimizeError;
use crate::file_manager::{lower_extension, BACKUP_DIR_PREFIX};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

pub const ALTERNATE_EXTENSION: &str = "webp";

/// Utility per calcolare i path in modo centralizzato
pub struct PathResolver;

impl PathResolver {
    /// Path of the WebP twin for `source`, or `None` when the source is already WebP
    pub fn alternate_path(source: &Path) -> Option<PathBuf> {
        if lower_extension(source) == ALTERNATE_EXTENSION {
            return None;
        }
        Some(Self::twin_of(source))
    }

    /// `<dir>/<stem>.webp`, regardless of the source format
    pub fn twin_of(source: &Path) -> PathBuf {
        source.with_extension(ALTERNATE_EXTENSION)
    }

    /// Snapshot directory name: `assets_backup_YYYY-MM-DDTHH-MM-SS-mmmZ`
    pub fn backup_dir_name(at: DateTime<Utc>) -> String {
        format!(
            "{}{}",
            BACKUP_DIR_PREFIX,
            at.format("%Y-%m-%dT%H-%M-%S-%3fZ")
        )
    }

    /// Destination of `file` inside the snapshot, mirroring its path relative to `root`.
    /// A file outside `root` has no mirror position and is rejected.
    pub fn backup_destination(
        root: &Path,
        backup_dir: &Path,
        file: &Path,
    ) -> Result<PathBuf, OptimizeError> {
        file.strip_prefix(root)
            .ok()
            .filter(|rel| !rel.as_os_str().is_empty())
            .map(|rel| backup_dir.join(rel))
            .ok_or_else(|| OptimizeError::OutsideRoot {
                file: file.to_path_buf(),
                root: root.to_path_buf(),
            })
    }

    /// Crea le directory parent se necessario
    pub async fn ensure_parent_dirs(path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}
