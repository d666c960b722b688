//! Headless run settings
//!
//! Loaded from RON; every field is optional.

use crate::error::Result;
use prestige_core::EngineConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// How the headless runner drives a game
///
/// # Example
///
/// ```
/// use prestige_cycles::RunConfig;
///
/// let config = RunConfig::from_ron_str("(seconds: 60.0, autoplay: false)").unwrap();
/// assert_eq!(config.ticks(), 1200);
/// assert_eq!(config.engine.offline_limit_hours, 1.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Wall-clock seconds to simulate
    pub seconds: f64,
    /// Seconds per tick
    pub step: f64,
    /// Offline time credited before the first tick
    pub offline_seconds: f64,
    /// Speed multiplier
    pub speed: f64,
    /// Buy everything affordable each tick and prestige when it doubles a layer
    pub autoplay: bool,
    /// Where to write the final save, if anywhere
    pub save_path: Option<PathBuf>,
    /// Engine limits, passed to the game as is
    pub engine: EngineConfig,
}

impl RunConfig {
    /// Parse from RON text
    pub fn from_ron_str(content: &str) -> Result<Self> {
        Ok(ron::from_str(content)?)
    }

    /// Load from a RON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_ron_str(&content)
    }

    /// Number of ticks the run takes
    pub fn ticks(&self) -> u64 {
        if self.step <= 0.0 || !self.seconds.is_finite() {
            return 0;
        }
        (self.seconds / self.step).round().max(0.0) as u64
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seconds: 600.0,
            step: 0.05,
            offline_seconds: 0.0,
            speed: 1.0,
            autoplay: true,
            save_path: None,
            engine: EngineConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.ticks(), 12000);
        assert!(config.autoplay);
        assert_eq!(config.save_path, None);
    }

    #[test]
    fn test_nested_engine_config() {
        let config = RunConfig::from_ron_str(
            "(step: 1.0, seconds: 10.0, engine: (offline_production: false), save_path: Some(\"save.ron\"))",
        )
        .unwrap();
        assert_eq!(config.ticks(), 10);
        assert!(!config.engine.offline_production);
        assert_eq!(config.save_path, Some(PathBuf::from("save.ron")));
    }

    #[test]
    fn test_degenerate_step() {
        let config = RunConfig {
            step: 0.0,
            ..Default::default()
        };
        assert_eq!(config.ticks(), 0);
        assert!(matches!(RunConfig::from_ron_str("(seconds: \"x\")"), Err(Error::Ron(_))));
    }
}
