//! # Task Optimizer Module
//!
//! Worker per la transcodifica di singoli file e limitatore di concorrenza.
//!
//! Ogni file è un'unità indipendente: il lavoro CPU dei codec gira sul
//! blocking pool di tokio, il numero di unità in volo è limitato da un
//! semaforo con `concurrency` permessi. Nessun timeout per file.

use crate::{
    config::Config,
    file_manager::AssetPath,
    image_processor::{ImageProcessor, TranscodeResult},
    optimizer::progress_tracker::ProgressTracker,
};
use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, error};

/// Limita il numero di transcodifiche simultanee
#[derive(Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    permits: usize,
}

impl ConcurrencyLimiter {
    pub fn new(permits: usize) -> Self {
        let permits = permits.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(permits)),
            permits,
        }
    }

    pub async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        self.semaphore.clone().acquire_owned().await.ok()
    }

    pub fn permits(&self) -> usize {
        self.permits
    }
}

/// Worker per elaborazione singoli file
#[derive(Clone)]
pub struct TaskOptimizer {
    processor: ImageProcessor,
}

impl TaskOptimizer {
    pub fn new(config: &Config) -> Self {
        Self {
            processor: ImageProcessor::new(config),
        }
    }

    /// Processa un singolo file sul blocking pool
    pub async fn process_single_file(&self, path: PathBuf) -> TranscodeResult {
        let processor = self.processor.clone();
        let task_path = path.clone();
        match tokio::task::spawn_blocking(move || processor.process(&task_path)).await {
            Ok(result) => result,
            Err(e) => {
                error!("Worker for {} aborted: {}", path.display(), e);
                TranscodeResult::failed(&path, format!("worker aborted: {e}"))
            }
        }
    }

    /// Transcode every file with at most `limiter.permits()` in flight.
    /// Results come back in input order; completion order is not significant.
    pub async fn process_all(
        &self,
        files: Vec<AssetPath>,
        limiter: &ConcurrencyLimiter,
        tracker: &ProgressTracker,
    ) -> Vec<TranscodeResult> {
        let mut paths = Vec::with_capacity(files.len());
        let mut tasks = Vec::with_capacity(files.len());

        for file in files {
            paths.push(file.path.clone());
            let permit = limiter.acquire().await;
            let worker = self.clone();
            let tracker = tracker.clone();

            tasks.push(tokio::spawn(async move {
                let _permit = permit;
                debug!("Transcoding {}", file.path.display());
                let result = worker.process_single_file(file.path).await;
                tracker.handle_file_completion(&result);
                result
            }));
        }

        join_all(tasks)
            .await
            .into_iter()
            .zip(paths)
            .map(|(joined, path)| match joined {
                Ok(result) => result,
                Err(e) => {
                    error!("Transcode task for {} failed to join: {}", path.display(), e);
                    TranscodeResult::failed(&path, format!("task failed: {e}"))
                }
            })
            .collect()
    }
}
