//! Error types for prestige-cycles

use thiserror::Error;

/// Game error type
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Engine(#[from] prestige_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("Unknown layer: {0}")]
    UnknownLayer(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
