//! Error types for the voxray core

use thiserror::Error;

/// Main error type for the crate
///
/// Steady-state world operations (block reads and writes, traversal,
/// resampling, meshing) never fail; errors only come from configuration,
/// GPU acquisition and file output.
#[derive(Debug, Error)]
pub enum Error {
    #[error("GPU error: {0}")]
    Gpu(String),

    /// A capability the hybrid path needs is missing on this host.
    /// The hybrid path stays disabled for the rest of the session.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(String),
}
