//! Identity types for layers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a layer, also used for its reset-tree node
///
/// Short string ids ("c", "hc") keep save data and logs readable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub String);

impl LayerId {
    /// Create a new layer ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LayerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for LayerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&LayerId> for LayerId {
    fn from(id: &LayerId) -> Self {
        id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_id() {
        let id = LayerId::new("hc");
        assert_eq!(id.as_str(), "hc");
        assert_eq!(format!("{}", id), "hc");
        assert_eq!(LayerId::from("hc"), id);
    }
}
