//! Error types for configuration loading and protection persistence
//!
//! State inconsistencies (unknown cells, double unloads, recount drift) are
//! not errors: they are logged and degrade to a safe no-op.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or writing configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse RON config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),

    #[error("failed to build layered config: {0}")]
    Layered(#[from] config::ConfigError),
}

/// Errors raised by protection stores
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode protection entries: {0}")]
    Encode(String),

    #[error("failed to decode protection entries: {0}")]
    Decode(String),

    #[error("failed to decompress protection file: {0}")]
    Decompress(String),

    #[error("protection store unavailable: {0}")]
    Unavailable(String),
}

impl PersistenceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PersistenceError::Io {
            path: path.into(),
            source,
        }
    }
}
