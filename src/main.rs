//! # Asset Image Optimizer - Main Entry Point
//!
//! Punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Composizione della configurazione: file JSON → variabili d'ambiente → flag
//! - Inizializzazione del logging (console + file) con `tracing`
//! - Avvio dell'optimizer e traduzione dell'esito in exit code
//!
//! ## Exit code:
//! - `0`: nessun file trovato o run completata senza errori
//! - `1`: errore fatale (root mancante, configurazione non valida)
//! - `2`: run completata con almeno un file fallito
//!
//! ## Esempio di utilizzo:
//! ```bash
//! ASSETS_DIR=./public/img CONCURRENCY=8 optimize-images --rename-seo --verbose
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::error;

use asset_image_optimizer::{logging, Config, MediaOptimizer};

#[derive(Parser)]
#[command(name = "optimize-images")]
#[command(about = "Optimize image assets in place with backups and WebP twins")]
struct Args {
    /// Normalize file names to SEO-safe slugs before optimizing
    #[arg(long)]
    rename_seo: bool,

    /// Dry run - compute outcomes without touching any file
    #[arg(long)]
    dry_run: bool,

    /// Emit one JSON event per line on stdout
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON config file applied before environment overrides
    #[arg(long)]
    config: Option<PathBuf>,
}

async fn build_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            let mut config = Config::from_file(path).await?;
            config.apply_lookup(|key| std::env::var(key).ok())?;
            config
        }
        None => Config::from_env()?,
    };

    config.rename |= args.rename_seo;
    config.dry_run |= args.dry_run;
    config.json_output |= args.json;
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match build_config(&args).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e:#}");
            std::process::exit(1);
        }
    };

    let guard = logging::init_logger(&config.log_file, args.verbose, config.json_output);

    let code = match MediaOptimizer::new(config) {
        Ok(optimizer) => match optimizer.run().await {
            Ok(report) => report.exit_code(),
            Err(e) => {
                error!("Fatal: {e:#}");
                1
            }
        },
        Err(e) => {
            error!("Fatal: {e:#}");
            1
        }
    };

    // Flush the file appender before exiting
    drop(guard);
    std::process::exit(code);
}
