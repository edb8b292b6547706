//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON (`--json`), un oggetto per riga su stdout.
//!
//! ## Tipi di messaggi:
//! - `start`: root, numero di file, flag e configurazione effettiva
//! - `file_complete`: esito di un singolo file
//! - `complete`: contatori aggregati, byte, risparmio e durata

use crate::config::Config;
use crate::image_processor::TranscodeResult;
use crate::progress::RunStats;
use serde::Serialize;
use std::path::PathBuf;

/// Tipo di messaggio JSON
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum JsonMessage {
    /// Inizio della run
    #[serde(rename = "start")]
    Start {
        root: PathBuf,
        total_files: usize,
        dry_run: bool,
        rename: bool,
        config: JsonConfig,
    },

    /// Fine elaborazione di un file
    #[serde(rename = "file_complete")]
    FileComplete {
        path: PathBuf,
        status: &'static str,
        original_size: u64,
        optimized_size: u64,
        alternate_size: Option<u64>,
        reduction_percent: f64,
        resized: bool,
        reason: Option<String>,
    },

    /// Run completata
    #[serde(rename = "complete")]
    Complete {
        succeeded: usize,
        skipped: usize,
        errors: usize,
        resized: usize,
        original_bytes: u64,
        optimized_bytes: u64,
        alternate_bytes: u64,
        reduction_percent: f64,
        duration_seconds: f64,
    },
}

/// Configurazione effettiva per output JSON
#[derive(Debug, Serialize)]
pub struct JsonConfig {
    pub concurrency: usize,
    pub max_dimension: u32,
    pub jpeg_quality: u8,
    pub webp_quality: u8,
    pub png_compression: u8,
    pub size_threshold: f64,
}

impl From<&Config> for JsonConfig {
    fn from(config: &Config) -> Self {
        Self {
            concurrency: config.concurrency,
            max_dimension: config.max_dimension,
            jpeg_quality: config.jpeg_quality,
            webp_quality: config.webp_quality,
            png_compression: config.png_compression,
            size_threshold: config.size_threshold,
        }
    }
}

impl JsonMessage {
    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn start(config: &Config, total_files: usize) -> Self {
        Self::Start {
            root: config.root.clone(),
            total_files,
            dry_run: config.dry_run,
            rename: config.rename,
            config: JsonConfig::from(config),
        }
    }

    pub fn file_complete(result: &TranscodeResult) -> Self {
        Self::FileComplete {
            path: result.path.clone(),
            status: result.status.label(),
            original_size: result.original_bytes,
            optimized_size: result.optimized_bytes,
            alternate_size: result.alternate_bytes,
            reduction_percent: result.savings_percent,
            resized: result.resized,
            reason: result.status.reason(),
        }
    }

    pub fn complete(stats: &RunStats, duration_seconds: f64) -> Self {
        Self::Complete {
            succeeded: stats.succeeded(),
            skipped: stats.skipped,
            errors: stats.failed,
            resized: stats.resized,
            original_bytes: stats.original_bytes,
            optimized_bytes: stats.optimized_bytes,
            alternate_bytes: stats.alternate_bytes,
            reduction_percent: stats.savings_percent(),
            duration_seconds,
        }
    }
}
