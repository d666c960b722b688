//! Error types for prestige-core
//!
//! Numeric domain problems never surface here: they saturate or poison inside
//! [`Decimal`](crate::Decimal), and non-invertible formulas return `None`.
//! These errors cover lookups and loading only.

use crate::LayerId;
use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Layer not found: {0}")]
    LayerNotFound(LayerId),

    #[error("Layer already registered: {0}")]
    DuplicateLayer(LayerId),

    #[error("Tree node not found: {0}")]
    NodeNotFound(LayerId),

    #[error("Tree node already present: {0}")]
    DuplicateNode(LayerId),

    #[error("Unknown parent {parent} for tree node {child}")]
    UnknownParent { parent: LayerId, child: LayerId },

    #[error("Invalid decimal literal: {0}")]
    InvalidDecimal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON parse error: {0}")]
    Config(#[from] ron::error::SpannedError),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
