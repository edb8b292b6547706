//! # Media Optimizer Main Orchestrator
//!
//! Orchestratore principale: sequenzia le fasi della run e possiede il
//! contratto dry-run / exit code.
//!
//! ## Fasi (lineari, senza ritorni):
//! 1. Validazione root (assente → errore fatale, exit 1)
//! 2. Scan (nessun file → report vuoto, exit 0)
//! 3. Backup (saltato in dry-run)
//! 4. Rename (solo con `--rename-seo`, saltato in dry-run)
//! 5. Re-scan (il rename può cambiare l'insieme dei file)
//! 6. Transcodifica con concorrenza limitata
//! 7. Report aggregato (exit 2 se almeno un file è fallito)

use crate::{
    backup::{BackupManager, BackupReport},
    config::Config,
    error::OptimizeError,
    file_manager::{absolute_path, FileManager},
    image_processor::TranscodeResult,
    json_output::JsonMessage,
    optimizer::{
        progress_tracker::ProgressTracker,
        task_optimizer::{ConcurrencyLimiter, TaskOptimizer},
    },
    progress::RunStats,
    rename::{RenameNormalizer, RenameReport},
};
use anyhow::Result;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Everything a finished run produced
#[derive(Debug, Default)]
pub struct RunReport {
    /// Candidates found by the first scan
    pub files_found: usize,
    pub backup: Option<BackupReport>,
    pub rename: Option<RenameReport>,
    pub results: Vec<TranscodeResult>,
    pub stats: RunStats,
    pub duration: Duration,
}

impl RunReport {
    /// 0 = success or nothing to do, 2 = completed with failed files
    pub fn exit_code(&self) -> i32 {
        if self.stats.failed > 0 {
            2
        } else {
            0
        }
    }
}

/// Orchestratore principale
pub struct MediaOptimizer {
    config: Config,
    limiter: ConcurrencyLimiter,
}

impl MediaOptimizer {
    /// Crea nuova istanza dell'ottimizzatore.
    ///
    /// La root viene resa assoluta una volta sola: scanner e backup
    /// lavorano sugli stessi path.
    pub fn new(mut config: Config) -> Result<Self> {
        config.validate()?;
        config.root = absolute_path(&config.root);
        let limiter = ConcurrencyLimiter::new(config.concurrency);
        Ok(Self { config, limiter })
    }

    /// Esegue la run completa
    pub async fn run(&self) -> Result<RunReport> {
        let start_time = Instant::now();
        let root = &self.config.root;

        if !root.is_dir() {
            return Err(OptimizeError::MissingRoot(root.clone()).into());
        }

        self.log_configuration();

        let files = FileManager::find_media_files(root);
        info!("Found {} images", files.len());
        if self.config.json_output {
            JsonMessage::start(&self.config, files.len()).emit();
        }

        let mut report = RunReport {
            files_found: files.len(),
            ..Default::default()
        };

        if files.is_empty() {
            info!("No images found, nothing to do");
            report.duration = start_time.elapsed();
            self.print_final_stats(&report);
            return Ok(report);
        }

        if self.config.dry_run {
            info!("Dry-run: backup skipped");
        } else {
            let manager = BackupManager::new(root, &self.config.backup_parent());
            report.backup = Some(manager.backup(&files).await);
        }

        if self.config.rename {
            if self.config.dry_run {
                info!("Dry-run: rename skipped");
            } else {
                report.rename = Some(RenameNormalizer::rename_all(&files).await);
            }
        }

        let files = FileManager::find_media_files(root);
        info!("Transcoding {} images with {} workers", files.len(), self.limiter.permits());

        let tracker = ProgressTracker::new(files.len(), self.config.json_output);
        let worker = TaskOptimizer::new(&self.config);
        report.results = worker.process_all(files, &self.limiter, &tracker).await;
        report.stats = RunStats::from_results(&report.results);
        tracker.finish(&report.stats.format_summary());

        report.duration = start_time.elapsed();
        self.print_final_stats(&report);
        Ok(report)
    }

    /// Logga configurazione effettiva
    fn log_configuration(&self) {
        let c = &self.config;
        info!("Asset image optimizer starting");
        info!("  Root: {}", c.root.display());
        info!("  Max dimension: {}px", c.max_dimension);
        info!(
            "  Quality: JPEG {} / WebP {} / PNG level {}",
            c.jpeg_quality, c.webp_quality, c.png_compression
        );
        info!("  Concurrency: {}", c.concurrency);
        info!("  Dry-run: {} | Rename: {}", c.dry_run, c.rename);
    }

    /// Stampa statistiche finali
    fn print_final_stats(&self, report: &RunReport) {
        let stats = &report.stats;
        let seconds = report.duration.as_secs_f64();

        if self.config.json_output {
            JsonMessage::complete(stats, seconds).emit();
        }

        info!("=== Optimization report ===");
        info!("Files found: {}", report.files_found);
        info!("Succeeded: {}", stats.succeeded());
        info!("Skipped: {}", stats.skipped);
        info!("Errors: {}", stats.failed);
        if stats.failed > 0 {
            for line in stats.error_sample() {
                error!("  {}", line);
            }
        }

        if let Some(rename) = &report.rename {
            info!("Renamed: {}", rename.renamed.len());
            if !rename.errors.is_empty() {
                warn!("Rename errors: {}", rename.errors.len());
            }
        }

        info!("Original size: {:.2} MB", FileManager::to_mb(stats.original_bytes));
        info!("Optimized size: {:.2} MB", FileManager::to_mb(stats.optimized_bytes));
        info!(
            "Saved: {:.2} MB ({:.1}%)",
            stats.bytes_saved() as f64 / (1024.0 * 1024.0),
            stats.savings_percent()
        );
        if stats.alternate_bytes > 0 {
            info!(
                "WebP twins: {:.2} MB ({:.1}% smaller than sources)",
                FileManager::to_mb(stats.alternate_bytes),
                stats.alternate_savings_percent()
            );
        }
        info!("Resized: {}", stats.resized);
        info!("Elapsed: {:.1}s", seconds);
        info!("Log file: {}", self.config.log_file.display());

        if let Some(BackupReport { dir: Some(dir), failed, .. }) = &report.backup {
            info!("Backup: {}", dir.display());
            if *failed > 0 {
                warn!("Backup incomplete: {} files could not be copied", failed);
            }
        }
        if self.config.dry_run {
            info!("Dry-run: no files were modified");
        }
    }
}
