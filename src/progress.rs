//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce la progress bar e le statistiche aggregate della run.
//!
//! ## Componenti principali:
//! - `ProgressManager`: progress bar `indicatif` (nascosta in modalità JSON)
//! - `RunStats`: contatori e totali in byte accumulati dai `TranscodeResult`
//!
//! ## Statistiche tracciate:
//! - **optimized / simulated**: file riscritti (o che lo sarebbero in dry-run)
//! - **skipped**: formati ignorati e contenuti animati
//! - **failed**: errori per file, con i primi 5 riportati nel report
//! - **original / optimized / alternate bytes**: totali per il calcolo dei risparmi
//! - **resized**: file ridimensionati nel box massimo
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:00:12] [========================>---------------] 31/50 (62%) [OK] hero.jpg: 41.3% saved
//! ```

use crate::file_manager::{display_name, FileManager};
use crate::image_processor::{TranscodeResult, TranscodeStatus};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Number of errors listed in the final report
pub const ERROR_SAMPLE_SIZE: usize = 5;

/// Manages progress reporting for the transcode phase
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager; `hidden` draws nothing
    pub fn new(total_files: u64, hidden: bool) -> Self {
        if hidden {
            return Self {
                bar: ProgressBar::hidden(),
            };
        }

        let bar = ProgressBar::new(total_files);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Advance by one file with a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

/// One-line progress message for a finished file
pub fn progress_message(result: &TranscodeResult) -> String {
    let name = display_name(&result.path);
    match &result.status {
        TranscodeStatus::Optimized | TranscodeStatus::Simulated => {
            format!("[OK] {}: {:.1}% saved", name, result.savings_percent)
        }
        TranscodeStatus::Skipped(reason) => format!("[SKIP] {}: {}", name, reason),
        TranscodeStatus::Failed(message) => format!("[ERROR] {}: {}", name, message),
    }
}

/// Aggregated outcome of the transcode phase
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunStats {
    pub optimized: usize,
    pub simulated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub resized: usize,
    pub original_bytes: u64,
    pub optimized_bytes: u64,
    pub alternate_bytes: u64,
    /// Original bytes of the files that produced a WebP twin
    pub alternate_source_bytes: u64,
    pub errors: Vec<(PathBuf, String)>,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_results(results: &[TranscodeResult]) -> Self {
        let mut stats = Self::new();
        for result in results {
            stats.add(result);
        }
        stats
    }

    pub fn add(&mut self, result: &TranscodeResult) {
        match &result.status {
            TranscodeStatus::Optimized => self.optimized += 1,
            TranscodeStatus::Simulated => self.simulated += 1,
            TranscodeStatus::Skipped(_) => {
                self.skipped += 1;
                return;
            }
            TranscodeStatus::Failed(message) => {
                self.failed += 1;
                self.errors.push((result.path.clone(), message.clone()));
                return;
            }
        }

        if result.resized {
            self.resized += 1;
        }
        self.original_bytes += result.original_bytes;
        self.optimized_bytes += result.optimized_bytes;
        if let Some(alt) = result.alternate_bytes {
            self.alternate_bytes += alt;
            self.alternate_source_bytes += result.original_bytes;
        }
    }

    pub fn succeeded(&self) -> usize {
        self.optimized + self.simulated
    }

    pub fn bytes_saved(&self) -> i64 {
        self.original_bytes as i64 - self.optimized_bytes as i64
    }

    pub fn savings_percent(&self) -> f64 {
        FileManager::calculate_reduction(self.original_bytes, self.optimized_bytes)
    }

    /// Savings of the WebP twins relative to their source files
    pub fn alternate_savings_percent(&self) -> f64 {
        FileManager::calculate_reduction(self.alternate_source_bytes, self.alternate_bytes)
    }

    /// First errors as `file: message`, followed by `... and N more` when truncated
    pub fn error_sample(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .errors
            .iter()
            .take(ERROR_SAMPLE_SIZE)
            .map(|(path, message)| format!("{}: {}", display_name(path), message))
            .collect();
        if self.errors.len() > ERROR_SAMPLE_SIZE {
            lines.push(format!("... and {} more", self.errors.len() - ERROR_SAMPLE_SIZE));
        }
        lines
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Succeeded: {} | Skipped: {} | Errors: {} | Saved: {} ({:.2}%)",
            self.succeeded(),
            self.skipped,
            self.failed,
            FileManager::format_size(self.bytes_saved().max(0) as u64),
            self.savings_percent()
        )
    }
}
