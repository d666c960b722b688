//! Engine configuration - offline time, speed and search limits
//!
//! Every field has a default, so a config file only needs to name what it
//! changes. Values are applied as given: a speed of zero pauses, a negative
//! offline limit is treated as no offline time at all.

use crate::error::Result;
use crate::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Limits for bisection when a formula has no closed-form inverse
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Halvings before a search settles for its best bound
    pub max_iterations: u32,
    /// Upper end of the bracket for amount searches
    pub upper_bound: Decimal,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_iterations: 256,
            upper_bound: Decimal::pow10(308),
        }
    }
}

/// Configuration for the tick scheduler and purchase solving
///
/// # Example
///
/// ```
/// use prestige_core::EngineConfig;
///
/// let config = EngineConfig::from_ron_str("(offline_limit_hours: 2.0)").unwrap();
/// assert_eq!(config.offline_limit_seconds(), 7200.0);
/// assert!(config.offline_production);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Cap on offline time credited at load, in hours
    pub offline_limit_hours: f64,
    /// Whether offline time is credited at all
    pub offline_production: bool,
    /// Initial game speed multiplier
    pub default_speed: f64,
    /// Bisection limits
    pub search: SearchConfig,
    /// Levels summed one by one before cumulative costs switch to a closed
    /// form or an estimate
    pub direct_sum_limit: u32,
}

impl EngineConfig {
    /// Parse from RON text
    pub fn from_ron_str(content: &str) -> Result<Self> {
        Ok(ron::from_str(content)?)
    }

    /// Load from a RON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_ron_str(&content)
    }

    /// Offline cap in seconds, never negative
    pub fn offline_limit_seconds(&self) -> f64 {
        (self.offline_limit_hours * 3600.0).max(0.0)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            offline_limit_hours: 1.0,
            offline_production: true,
            default_speed: 1.0,
            search: SearchConfig::default(),
            direct_sum_limit: 1000,
        }
    }
}
