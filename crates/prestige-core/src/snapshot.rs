//! Save data: persisted layer state as plain serializable values
//!
//! Only persisted values are captured. Derived values and transient resources
//! are recomputed from these after a restore.

use crate::error::{Error, Result};
use crate::{Clock, Decimal, Layer, LayerId, LayerRegistry};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Challenge progress
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChallengeSnapshot {
    pub active: bool,
    pub completions: Decimal,
}

/// Best and total values of a conversion tracker
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerSnapshot {
    pub best: Decimal,
    pub total: Decimal,
}

/// Persisted state of one layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerSnapshot {
    pub resources: IndexMap<String, Decimal>,
    pub flags: IndexMap<String, bool>,
    pub upgrades: IndexMap<String, bool>,
    pub repeatables: IndexMap<String, Decimal>,
    pub challenges: IndexMap<String, ChallengeSnapshot>,
    /// Visibility latches keyed by latch name
    pub revealed: IndexMap<String, bool>,
    pub tracker: Option<TrackerSnapshot>,
}

impl LayerSnapshot {
    pub fn capture(layer: &Layer) -> Self {
        let resources = layer
            .resources()
            .filter(|r| r.is_persisted())
            .map(|r| (r.name().to_string(), r.value()))
            .collect();
        let flags = layer
            .flags()
            .map(|f| (f.name().to_string(), f.get()))
            .collect();
        let upgrades = layer
            .upgrades()
            .map(|u| (u.id().to_string(), u.is_bought()))
            .collect();
        let repeatables = layer
            .repeatables()
            .map(|r| (r.id().to_string(), r.owned()))
            .collect();
        let challenges = layer
            .challenges()
            .map(|c| {
                let progress = ChallengeSnapshot {
                    active: c.is_active(),
                    completions: c.completion_count(),
                };
                (c.id().to_string(), progress)
            })
            .collect();
        let revealed = layer
            .visibilities()
            .into_iter()
            .map(|v| (v.revealed_flag().name().to_string(), v.is_revealed()))
            .collect();
        let tracker = layer
            .conversion()
            .and_then(|c| c.tracker())
            .map(|t| TrackerSnapshot {
                best: t.best.value(),
                total: t.total.value(),
            });

        Self {
            resources,
            flags,
            upgrades,
            repeatables,
            challenges,
            revealed,
            tracker,
        }
    }

    /// Write values back into `layer`; names the layer no longer has are skipped
    pub fn restore(&self, layer: &Layer) {
        for (name, value) in &self.resources {
            match layer.resource(name) {
                Some(resource) => resource.set(*value),
                None => tracing::debug!(layer = %layer.id(), name, "unknown resource in save"),
            }
        }
        for (name, value) in &self.flags {
            if let Some(flag) = layer.flag(name) {
                flag.set(*value);
            }
        }
        for (id, bought) in &self.upgrades {
            if let Some(upgrade) = layer.upgrade(id) {
                upgrade.bought().set(*bought);
            }
        }
        for (id, amount) in &self.repeatables {
            if let Some(repeatable) = layer.repeatable(id) {
                repeatable.amount().set(*amount);
            }
        }
        for (id, progress) in &self.challenges {
            if let Some(challenge) = layer.challenge(id) {
                challenge.active().set(progress.active);
                challenge.completions().set(progress.completions);
            }
        }
        for visibility in layer.visibilities() {
            if let Some(revealed) = self.revealed.get(visibility.revealed_flag().name()) {
                visibility.revealed_flag().set(*revealed);
            }
        }
        if let (Some(saved), Some(tracker)) = (
            &self.tracker,
            layer.conversion().and_then(|c| c.tracker()),
        ) {
            tracker.best.set(saved.best);
            tracker.total.set(saved.total);
        }
    }
}

/// A complete save
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub clock: Clock,
    pub layers: IndexMap<LayerId, LayerSnapshot>,
}

impl Snapshot {
    /// Capture every registered layer
    pub fn capture(registry: &LayerRegistry, clock: &Clock) -> Self {
        Self {
            clock: clock.clone(),
            layers: registry
                .iter()
                .map(|layer| (layer.id().clone(), LayerSnapshot::capture(layer)))
                .collect(),
        }
    }

    /// Restore into a freshly built registry
    ///
    /// Layers missing from the save keep their defaults. Layers in the save
    /// that are no longer registered are skipped with a warning.
    pub fn restore(&self, registry: &LayerRegistry) -> Clock {
        for (id, saved) in &self.layers {
            match registry.get(id) {
                Some(layer) => saved.restore(layer),
                None => tracing::warn!(layer = %id, "save contains unregistered layer"),
            }
        }
        self.clock.clone()
    }

    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    pub fn from_ron_str(content: &str) -> Result<Self> {
        Ok(ron::from_str(content)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_ron()?)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_ron_str(&content)
    }
}
