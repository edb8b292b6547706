//! # Logging Setup
//!
//! Console + append-only file logging through `tracing`.
//!
//! Every event is written twice: once to the console (stdout, or stderr when
//! stdout carries JSON events) and once, without ANSI colours, to the log
//! file through a non-blocking appender. Both sinks prefix each line with an
//! RFC-3339 timestamp. If the log file cannot be opened the run continues
//! with console output only.

use std::path::Path;
use tracing::{warn, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;
use tracing_subscriber::{fmt, EnvFilter};

/// Build the `EnvFilter`: `RUST_LOG` wins, otherwise `info` (or `debug` when verbose)
fn build_filter(verbose: bool) -> EnvFilter {
    let default_level = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Open the append-only log file appender
fn file_appender(log_file: &Path) -> Result<RollingFileAppender, String> {
    let file_name = log_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| format!("invalid log file path: {}", log_file.display()))?;
    let dir = match log_file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)
        .map_err(|e| e.to_string())
}

/// Timestamped, colourless `fmt` layer over the non-blocking file writer
fn file_layer<S>(log_file: &Path) -> Result<(impl Layer<S>, WorkerGuard), String>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender(log_file)?);
    let layer = fmt::layer()
        .with_writer(non_blocking)
        .with_target(false)
        .with_ansi(false);
    Ok((layer, guard))
}

/// Install the global subscriber.
///
/// The returned guard flushes the file sink when dropped and must be kept
/// alive by `main` until the process exits.
pub fn init_logger(log_file: &Path, verbose: bool, json_output: bool) -> Option<WorkerGuard> {
    let console_writer = if json_output {
        BoxMakeWriter::new(std::io::stderr)
    } else {
        BoxMakeWriter::new(std::io::stdout)
    };
    let console_layer = fmt::layer()
        .with_writer(console_writer)
        .with_target(false)
        .with_ansi(!json_output);

    let (file_sink, guard, file_error) = match file_layer(log_file) {
        Ok((layer, guard)) => (Some(layer), Some(guard), None),
        Err(e) => (None, None, Some(e)),
    };

    let installed = tracing_subscriber::registry()
        .with(build_filter(verbose))
        .with(console_layer)
        .with(file_sink)
        .try_init();

    if installed.is_ok() {
        if let Some(e) = file_error {
            warn!("Log file {} unavailable, console only: {}", log_file.display(), e);
        }
    }

    guard
}
