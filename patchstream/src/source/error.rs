//! Source error types.

use thiserror::Error;

use crate::grid::DecodeError;

/// Errors from patch sources and the source registry.
///
/// Fetch-path variants are caught by the load pipeline, logged, and
/// isolated to the patch that caused them; only [`NoSourceAvailable`]
/// escalates to the caller.
///
/// [`NoSourceAvailable`]: SourceError::NoSourceAvailable
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP transfer failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Local filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fetched bytes did not decode as a grid file.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Manifest file was unreadable or not a JSON array of paths.
    #[error("manifest error: {0}")]
    Manifest(String),

    /// Store operation rejected (read-only source, data-less patch).
    #[error("store failed: {0}")]
    Store(String),

    /// No writable local source found when persistence was requested.
    #[error("no writable local source available")]
    NoSourceAvailable,
}
