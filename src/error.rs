//! Error types for the nuke subsystem.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by nuke and unnuke operations.
///
/// Only a handful of failures abort an operation; everything else is logged
/// at the point it happens and the operation carries on.
#[derive(Debug, Error)]
pub enum NukingError {
    /// The ownership survey could not read part of the tree. Raised before
    /// any credits move or any file is touched.
    #[error("error while nuking {path}: {source}")]
    Aggregate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// No nuke record could be found for the directory being unnuked.
    #[error("unable to locate nuke data for {0}")]
    RecordNotFound(PathBuf),

    /// The multiplier is zero, negative, or above the configured maximum.
    #[error("invalid nuke multiplier / percent: {0}")]
    InvalidMultiplier(i32),

    /// The record store failed in a way that could not be worked around.
    #[error("nuke store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, NukingError>;
