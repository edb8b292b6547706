//! # File Management Module
//!
//! Questo modulo gestisce la classificazione dei percorsi e la discovery delle immagini.
//!
//! ## Responsabilità:
//! - Classificazione di un nome file (ottimizzabile, ignorato, irrilevante)
//! - Scansione ricorsiva dell'albero degli asset con regole di esclusione
//! - Utilità per calcoli dimensioni e percentuali
//!
//! ## Formati:
//! - **Ottimizzabili**: JPG, JPEG, PNG, WebP, TIFF, TIF
//! - **Ignorati**: GIF, SVG, ICO (mai aperti né scritti, possono essere animati o vettoriali)
//!
//! ## Esclusioni durante la scansione:
//! - Voci nascoste (nome che inizia con `.`)
//! - Directory `node_modules`, `.git`, `assets_backup`
//! - Snapshot di backup precedenti (`assets_backup_*`)
//! - Link simbolici (non seguiti)
//!
//! ## Esempio:
//! ```rust,no_run
//! use asset_image_optimizer::file_manager::FileManager;
//! use std::path::Path;
//!
//! let files = FileManager::find_media_files(Path::new("src/assets"));
//! for file in files {
//!     println!("{} ({})", file.path.display(), file.extension);
//! }
//! ```

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

pub const OPTIMIZABLE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "tiff", "tif"];
pub const IGNORED_EXTENSIONS: &[&str] = &["gif", "svg", "ico"];
pub const IGNORED_DIRS: &[&str] = &["node_modules", ".git", "assets_backup"];
pub const BACKUP_DIR_PREFIX: &str = "assets_backup_";

/// Classification of a file by its name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// Raster image the pipeline decodes and re-encodes
    Optimizable,
    /// Deliberately excluded format, never opened
    Ignored,
    /// Anything else
    Irrelevant,
}

/// A discovered file with its lower-cased extension and classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPath {
    pub path: PathBuf,
    pub extension: String,
    pub kind: AssetKind,
}

impl AssetPath {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let extension = lower_extension(&path);
        let kind = FileManager::classify(&path);
        Self {
            path,
            extension,
            kind,
        }
    }
}

/// Lower-cased extension, empty when the path has none
pub fn lower_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Manages file classification and discovery
pub struct FileManager;

impl FileManager {
    /// Classify a path by its extension, case-insensitively
    pub fn classify(path: &Path) -> AssetKind {
        let ext = lower_extension(path);
        if OPTIMIZABLE_EXTENSIONS.contains(&ext.as_str()) {
            AssetKind::Optimizable
        } else if IGNORED_EXTENSIONS.contains(&ext.as_str()) {
            AssetKind::Ignored
        } else {
            AssetKind::Irrelevant
        }
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut value = size as f64;
        let mut unit = 0;

        while value >= 1024.0 && unit < UNITS.len() - 1 {
            value /= 1024.0;
            unit += 1;
        }

        if unit == 0 {
            format!("{} {}", size, UNITS[0])
        } else {
            format!("{:.2} {}", value, UNITS[unit])
        }
    }

    /// Size in mebibytes, for reports
    pub fn to_mb(size: u64) -> f64 {
        size as f64 / (1024.0 * 1024.0)
    }

    /// Percentage saved going from `original_size` to `new_size`
    pub fn calculate_reduction(original_size: u64, new_size: u64) -> f64 {
        (original_size as f64 - new_size as f64) / original_size.max(1) as f64 * 100.0
    }
}

/// Absolute form of `path` against the current directory, without touching the file system
pub fn absolute_path(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// File name as a displayable string
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_else(|| OsStr::new(""))
        .to_string_lossy()
        .into_owned()
}
