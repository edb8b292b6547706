//! # Asset Image Optimizer Library
//!
//! Modulo principale della libreria che espone le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per altri consumatori
//!
//! ## Architettura dei moduli:
//! - `config`: Configurazione (default, env, file JSON) e validazione
//! - `error`: Tipi di errore per le operazioni per file
//! - `logging`: Console + file log con `tracing`
//! - `file_manager`: Classificazione path e scansione dell'albero
//! - `backup`: Snapshot dei file prima di ogni modifica
//! - `policy`: Scelta di qualità e dimensione per file
//! - `image_processor`: Pipeline di transcodifica (JPEG/PNG/TIFF/WebP)
//! - `atomic`: Scritture temp + rename nella stessa directory
//! - `rename`: Normalizzazione SEO dei nomi file
//! - `optimizer`: Orchestratore, worker e progress
//! - `progress` / `json_output`: Statistiche, barra e output JSON
//!
//! ## Utilizzo:
//! ```no_run
//! use asset_image_optimizer::{Config, MediaOptimizer};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let optimizer = MediaOptimizer::new(Config::default())?;
//! let report = optimizer.run().await?;
//! std::process::exit(report.exit_code());
//! # }
//! ```

pub mod atomic;
pub mod backup;
pub mod config;
pub mod error;
pub mod file_manager;
pub mod image_processor;
pub mod json_output;
pub mod logging;
pub mod optimizer;
pub mod policy;
pub mod progress;
pub mod rename;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use config::Config;
pub use error::OptimizeError;
pub use optimizer::{MediaOptimizer, RunReport};
