//! Layer registry - lookup by id and the active set

use crate::error::{Error, Result};
use crate::{CascadePolicy, Layer, LayerId, ResetReport, ResetTree};
use indexmap::IndexMap;

/// All layers of a game, in registration order
///
/// Registration order is tick order: a layer that reads another layer's
/// post-tick value must be registered after it.
#[derive(Debug, Default)]
pub struct LayerRegistry {
    layers: IndexMap<LayerId, Layer>,
    inactive: Vec<LayerId>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer at the end of the tick order
    pub fn register(&mut self, layer: Layer) -> Result<()> {
        if self.layers.contains_key(layer.id()) {
            return Err(Error::DuplicateLayer(layer.id().clone()));
        }
        tracing::debug!(layer = %layer.id(), "layer registered");
        self.layers.insert(layer.id().clone(), layer);
        Ok(())
    }

    pub fn get(&self, id: &LayerId) -> Option<&Layer> {
        self.layers.get(id)
    }

    /// Like [`get`](Self::get), for callers that treat a missing layer as an error
    pub fn layer(&self, id: &LayerId) -> Result<&Layer> {
        self.layers
            .get(id)
            .ok_or_else(|| Error::LayerNotFound(id.clone()))
    }

    pub fn contains(&self, id: &LayerId) -> bool {
        self.layers.contains_key(id)
    }

    /// Lock or unlock a layer; inactive layers keep their state but skip ticks
    pub fn set_active(&mut self, id: &LayerId, active: bool) -> Result<()> {
        if !self.layers.contains_key(id) {
            return Err(Error::LayerNotFound(id.clone()));
        }
        self.inactive.retain(|inactive| inactive != id);
        if !active {
            self.inactive.push(id.clone());
        }
        Ok(())
    }

    pub fn is_active(&self, id: &LayerId) -> bool {
        self.layers.contains_key(id) && !self.inactive.contains(id)
    }

    /// Every layer in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.values()
    }

    /// Active layers in registration order
    pub fn active_layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers
            .values()
            .filter(|layer| !self.inactive.contains(layer.id()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &LayerId> {
        self.layers.keys()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// The reset button: convert if anything would be gained, then reset
    /// whatever the tree cascades to from `id`
    pub fn prestige(
        &self,
        id: &LayerId,
        tree: &ResetTree,
        policy: CascadePolicy,
    ) -> Result<ResetReport> {
        let layer = self.layer(id)?;
        if let Some(conversion) = layer.conversion() {
            if conversion.can_convert() {
                conversion.trigger();
            }
        }
        tree.reset_cascade(self, id, policy)
    }
}
