//! # Configuration Management Module
//!
//! Holds every tunable of a run and knows how to build itself from the
//! environment.
//!
//! ## Parameters:
//! - `root`: directory to scan (`ASSETS_DIR`, default `<program dir>/src/assets`)
//! - `concurrency`: simultaneous transcodes (`CONCURRENCY`, default 6)
//! - `max_dimension`: resize box in pixels (`MAX_DIMENSION`, default 3840)
//! - `jpeg_quality`: baseline primary quality (`JPEG_QUALITY`, default 82)
//! - `webp_quality`: baseline alternate quality (`WEBP_QUALITY`, default 80)
//! - `png_compression`: baseline lossless level 0-9 (`PNG_COMPRESSION`, default 8)
//! - `size_threshold`: keep original unless new < original * threshold (`SIZE_THRESHOLD`, default 1.0)
//! - `backup_dir`: parent for backup snapshots (`BACKUP_DIR`, default parent of root)
//! - `log_file`: append-only log (`LOG_FILE`, default `<program dir>/optimize-images.log`)
//! - `dry_run`, `rename`, `json_output`: set from CLI flags
//!
//! ## Layering:
//! defaults → optional JSON file (`from_file`) → environment (`apply_lookup`) → CLI flags.
//!
//! ## Example:
//! ```rust,no_run
//! use asset_image_optimizer::Config;
//!
//! let mut config = Config::from_env()?;
//! config.dry_run = true;
//! config.validate()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::error::OptimizeError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_CONCURRENCY: usize = 6;
pub const DEFAULT_MAX_DIMENSION: u32 = 3840;
pub const DEFAULT_JPEG_QUALITY: u8 = 82;
pub const DEFAULT_WEBP_QUALITY: u8 = 80;
pub const DEFAULT_PNG_COMPRESSION: u8 = 8;
pub const LOG_FILE_NAME: &str = "optimize-images.log";

/// Configuration for an optimization run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory scanned for images
    pub root: PathBuf,
    /// Maximum number of transcodes in flight
    pub concurrency: usize,
    /// Longest side allowed before resizing
    pub max_dimension: u32,
    /// Baseline quality for the primary lossy output (1-100)
    pub jpeg_quality: u8,
    /// Baseline quality for the WebP output (1-100)
    pub webp_quality: u8,
    /// Baseline PNG compression level (0-9)
    pub png_compression: u8,
    /// Primary output replaces the original only if smaller than original * threshold
    pub size_threshold: f64,
    /// Directory under which backup snapshots are created (None = parent of root)
    pub backup_dir: Option<PathBuf>,
    /// Append-only log file
    pub log_file: PathBuf,
    /// Simulate only: no backup, no rename, no writes
    pub dry_run: bool,
    /// Normalize file names before optimizing
    pub rename: bool,
    /// Emit JSON events on stdout
    pub json_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        let program_dir = program_dir();
        Self {
            root: program_dir.join("src").join("assets"),
            concurrency: DEFAULT_CONCURRENCY,
            max_dimension: DEFAULT_MAX_DIMENSION,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            webp_quality: DEFAULT_WEBP_QUALITY,
            png_compression: DEFAULT_PNG_COMPRESSION,
            size_threshold: 1.0,
            backup_dir: None,
            log_file: program_dir.join(LOG_FILE_NAME),
            dry_run: false,
            rename: false,
            json_output: false,
        }
    }
}

/// Directory containing the running executable, or the working directory
/// when it cannot be determined.
fn program_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

impl Config {
    /// Build a configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_lookup(|key| std::env::var(key).ok())?)
    }

    /// Build a configuration from defaults plus the given variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, OptimizeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.apply_lookup(lookup)?;
        Ok(config)
    }

    /// Apply environment-style overrides from an arbitrary lookup.
    ///
    /// Unset or empty variables keep the current value; values that do not
    /// parse are rejected.
    pub fn apply_lookup<F>(&mut self, lookup: F) -> Result<(), OptimizeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = non_empty(lookup("ASSETS_DIR")) {
            self.root = PathBuf::from(root);
        }
        parse_into(&lookup, "CONCURRENCY", &mut self.concurrency)?;
        parse_into(&lookup, "MAX_DIMENSION", &mut self.max_dimension)?;
        parse_into(&lookup, "JPEG_QUALITY", &mut self.jpeg_quality)?;
        parse_into(&lookup, "WEBP_QUALITY", &mut self.webp_quality)?;
        parse_into(&lookup, "PNG_COMPRESSION", &mut self.png_compression)?;
        parse_into(&lookup, "SIZE_THRESHOLD", &mut self.size_threshold)?;
        if let Some(dir) = non_empty(lookup("BACKUP_DIR")) {
            self.backup_dir = Some(PathBuf::from(dir));
        }
        if let Some(file) = non_empty(lookup("LOG_FILE")) {
            self.log_file = PathBuf::from(file);
        }
        Ok(())
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), OptimizeError> {
        if self.concurrency == 0 {
            return Err(OptimizeError::Validation(
                "CONCURRENCY must be greater than 0".to_string(),
            ));
        }

        if self.max_dimension == 0 {
            return Err(OptimizeError::Validation(
                "MAX_DIMENSION must be greater than 0".to_string(),
            ));
        }

        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(OptimizeError::Validation(
                "JPEG_QUALITY must be between 1 and 100".to_string(),
            ));
        }

        if self.webp_quality == 0 || self.webp_quality > 100 {
            return Err(OptimizeError::Validation(
                "WEBP_QUALITY must be between 1 and 100".to_string(),
            ));
        }

        if self.png_compression > 9 {
            return Err(OptimizeError::Validation(
                "PNG_COMPRESSION must be between 0 and 9".to_string(),
            ));
        }

        if !(self.size_threshold > 0.0 && self.size_threshold <= 1.0) {
            return Err(OptimizeError::Validation(
                "SIZE_THRESHOLD must be between 0.0 (exclusive) and 1.0".to_string(),
            ));
        }

        Ok(())
    }

    /// Directory under which the backup snapshot for this run is created
    pub fn backup_parent(&self) -> PathBuf {
        match &self.backup_dir {
            Some(dir) => dir.clone(),
            None => self
                .root
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.root.clone()),
        }
    }

    /// Load configuration from a JSON file; missing keys keep their defaults
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_into<F, T>(lookup: &F, key: &str, slot: &mut T) -> Result<(), OptimizeError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(raw) = non_empty(lookup(key)) {
        *slot = raw
            .parse()
            .map_err(|_| OptimizeError::Validation(format!("{key} has an invalid value: {raw:?}")))?;
    }
    Ok(())
}
