//! # Error Types Module
//!
//! Defines the typed errors raised by the pipeline components.
//!
//! ## Categories:
//! - `Io`: file system failures (read, write, rename, copy)
//! - `Image`: decoder failures reported by the `image` crate
//! - `EmptyInput`: zero-length or truncated source files
//! - `Metadata`: images whose dimensions cannot be determined
//! - `Encode`: a format encoder refused the image
//! - `UnsupportedFormat`: extension or container the pipeline cannot handle
//! - `CollisionLimit`: rename could not find a free name
//! - `MissingRoot`: the assets directory does not exist (fatal)
//! - `OutsideRoot`: a file cannot be mirrored relative to the assets root
//! - `Validation`: invalid configuration values (fatal)
//!
//! Per-file errors are turned into `TranscodeStatus::Failed` by the
//! transcoding pipeline; only `MissingRoot` and `Validation` reach `main`.

use std::path::PathBuf;

/// Custom error types for asset optimization
#[derive(thiserror::Error, Debug)]
pub enum OptimizeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Empty or corrupt file")]
    EmptyInput,

    #[error("Could not read image metadata: {0}")]
    Metadata(String),

    #[error("{format} encoding failed: {message}")]
    Encode {
        format: &'static str,
        message: String,
    },

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Too many name collisions for {0}")]
    CollisionLimit(String),

    #[error("Assets directory does not exist: {}", .0.display())]
    MissingRoot(PathBuf),

    #[error("{} is not under {}", .file.display(), .root.display())]
    OutsideRoot { file: PathBuf, root: PathBuf },

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

impl OptimizeError {
    pub fn encode(format: &'static str, message: impl ToString) -> Self {
        Self::Encode {
            format,
            message: message.to_string(),
        }
    }
}
