//! # Optimizer Module
//!
//! Modulo che separa le responsabilità della run in sottomoduli:
//! - `media_optimizer`: Orchestratore principale (fasi, report, exit code)
//! - `task_optimizer`: Worker per singoli file e limitatore di concorrenza
//! - `progress_tracker`: Gestione progress unificata (log, JSON, barra)
//! - `path_resolver`: Calcolo path per twin WebP e backup

pub mod media_optimizer;
pub mod task_optimizer;
pub mod progress_tracker;
pub mod path_resolver;

pub use media_optimizer::{MediaOptimizer, RunReport};
pub use task_optimizer::{ConcurrencyLimiter, TaskOptimizer};
pub use progress_tracker::ProgressTracker;
pub use path_resolver::PathResolver;
