//! # Progress Tracking Module
//!
//! Tracker thread-safe condiviso tra i worker di transcodifica.
//! Gestisce sia l'output JSON che la progress bar tradizionale.

use crate::{
    image_processor::{TranscodeResult, TranscodeStatus},
    json_output::JsonMessage,
    progress::{progress_message, ProgressManager},
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{error, info};

/// Tracker progress condiviso: contatori atomici + progress bar
#[derive(Clone)]
pub struct ProgressTracker {
    pub total_files: usize,
    completed: Arc<AtomicUsize>,
    json_output: bool,
    progress_manager: ProgressManager,
}

impl ProgressTracker {
    pub fn new(total_files: usize, json_output: bool) -> Self {
        Self {
            total_files,
            completed: Arc::new(AtomicUsize::new(0)),
            json_output,
            progress_manager: ProgressManager::new(total_files as u64, json_output),
        }
    }

    /// Log, emit and advance for one finished file
    pub fn handle_file_completion(&self, result: &TranscodeResult) {
        let done = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
        let message = progress_message(result);

        match &result.status {
            TranscodeStatus::Failed(_) => error!("({}/{}) {}", done, self.total_files, message),
            _ => info!("({}/{}) {}", done, self.total_files, message),
        }

        if self.json_output {
            JsonMessage::file_complete(result).emit();
        }
        self.progress_manager.update(&message);
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    /// Finalizza progress bar
    pub fn finish(&self, summary: &str) {
        self.progress_manager.finish(summary);
    }
}
