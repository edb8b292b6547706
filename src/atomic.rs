//! # Atomic Writer
//!
//! Every byte this tool puts on disk goes through here: the buffer lands in a
//! temporary file next to the destination (`.<name>.tmp-XXXXXX`), is flushed
//! and synced, then renamed over the destination. Readers see either the old
//! file or the new one. If the process dies before the rename the
//! destination is untouched; a dropped [`StagedWrite`] removes its temp file.

use crate::error::OptimizeError;
use std::fs::{File, FileTimes, Metadata};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::NamedTempFile;
use tracing::debug;

/// Buffer written to a temp file, not yet visible at its destination
pub struct StagedWrite {
    temp: NamedTempFile,
    destination: PathBuf,
}

impl StagedWrite {
    /// Path of the temporary file
    pub fn temp_path(&self) -> &Path {
        self.temp.path()
    }

    /// Rename the temp file onto the destination
    pub fn commit(self) -> Result<(), OptimizeError> {
        debug!(
            "Replacing {} with {}",
            self.destination.display(),
            self.temp_path().display()
        );
        self.temp
            .persist(&self.destination)
            .map_err(|e| OptimizeError::Io(e.error))?;
        Ok(())
    }
}

/// Write `bytes` to a synced temp file in the destination directory
pub fn stage(destination: &Path, bytes: &[u8]) -> Result<StagedWrite, OptimizeError> {
    let dir = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut temp = tempfile::Builder::new()
        .prefix(&format!(".{name}.tmp-"))
        .tempfile_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file_mut().sync_all()?;

    Ok(StagedWrite {
        temp,
        destination: destination.to_path_buf(),
    })
}

/// Atomically replace `destination` with `bytes`
pub fn write_atomic(destination: &Path, bytes: &[u8]) -> Result<(), OptimizeError> {
    stage(destination, bytes)?.commit()
}

/// Access and modification times captured before a rewrite
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStamps {
    pub accessed: Option<SystemTime>,
    pub modified: Option<SystemTime>,
}

impl From<&Metadata> for FileStamps {
    fn from(metadata: &Metadata) -> Self {
        Self {
            accessed: metadata.accessed().ok(),
            modified: metadata.modified().ok(),
        }
    }
}

/// Restore access/modification times. Failures are logged at debug level
/// and otherwise ignored.
pub fn restore_times(path: &Path, stamps: &FileStamps) {
    let mut times = FileTimes::new();
    if let Some(accessed) = stamps.accessed {
        times = times.set_accessed(accessed);
    }
    if let Some(modified) = stamps.modified {
        times = times.set_modified(modified);
    }

    let result = File::options()
        .write(true)
        .open(path)
        .and_then(|file| file.set_times(times));
    if let Err(e) = result {
        debug!("Could not restore timestamps on {}: {}", path.display(), e);
    }
}
