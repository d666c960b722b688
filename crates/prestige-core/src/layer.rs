//! Layers: a named bundle of resources, purchases and a tick handler
//!
//! A layer owns its state. Other layers read it through the registry and the
//! read-only handles it exports; only its own update handler and purchase
//! hooks write to it.

use crate::scheduler::TickContext;
use crate::{
    Challenge, Conversion, Flag, LayerId, ModifierPipeline, Repeatable, Resettable, Resource,
    Upgrade, Visibility,
};
use indexmap::IndexMap;
use std::fmt;

/// Runs once per tick while the layer is active
pub type UpdateHandler = Box<dyn Fn(&TickContext)>;

/// Lists what a reset of this layer clears, evaluated at reset time
pub type Manifest = Box<dyn Fn() -> Vec<Box<dyn Resettable>>>;

/// A progression layer
pub struct Layer {
    id: LayerId,
    name: String,
    resources: IndexMap<String, Resource>,
    flags: IndexMap<String, Flag>,
    pipelines: IndexMap<String, ModifierPipeline>,
    conversion: Option<Conversion>,
    upgrades: IndexMap<String, Upgrade>,
    repeatables: IndexMap<String, Repeatable>,
    challenges: IndexMap<String, Challenge>,
    visibilities: Vec<Visibility>,
    update: Option<UpdateHandler>,
    manifest: Option<Manifest>,
}

impl Layer {
    pub fn new(id: impl Into<LayerId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            resources: IndexMap::new(),
            flags: IndexMap::new(),
            pipelines: IndexMap::new(),
            conversion: None,
            upgrades: IndexMap::new(),
            repeatables: IndexMap::new(),
            challenges: IndexMap::new(),
            visibilities: Vec::new(),
            update: None,
            manifest: None,
        }
    }

    pub fn with_resource(mut self, resource: &Resource) -> Self {
        self.resources
            .insert(resource.name().to_string(), resource.clone());
        self
    }

    pub fn with_flag(mut self, flag: &Flag) -> Self {
        self.flags.insert(flag.name().to_string(), flag.clone());
        self
    }

    pub fn with_pipeline(mut self, name: impl Into<String>, pipeline: ModifierPipeline) -> Self {
        self.pipelines.insert(name.into(), pipeline);
        self
    }

    pub fn with_conversion(mut self, conversion: Conversion) -> Self {
        self.conversion = Some(conversion);
        self
    }

    pub fn with_upgrade(mut self, upgrade: &Upgrade) -> Self {
        self.upgrades
            .insert(upgrade.id().to_string(), upgrade.clone());
        self
    }

    pub fn with_repeatable(mut self, repeatable: &Repeatable) -> Self {
        self.repeatables
            .insert(repeatable.id().to_string(), repeatable.clone());
        self
    }

    pub fn with_challenge(mut self, challenge: &Challenge) -> Self {
        self.challenges
            .insert(challenge.id().to_string(), challenge.clone());
        self
    }

    /// Track a sticky visibility that is not attached to a purchase
    pub fn with_visibility(mut self, visibility: &Visibility) -> Self {
        self.visibilities.push(visibility.clone());
        self
    }

    pub fn on_update(mut self, handler: impl Fn(&TickContext) + 'static) -> Self {
        self.update = Some(Box::new(handler));
        self
    }

    /// Replace the default manifest (every persisted item of the layer)
    pub fn with_manifest(
        mut self,
        manifest: impl Fn() -> Vec<Box<dyn Resettable>> + 'static,
    ) -> Self {
        self.manifest = Some(Box::new(manifest));
        self
    }

    pub fn id(&self) -> &LayerId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources.get(name)
    }

    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    pub fn flag(&self, name: &str) -> Option<&Flag> {
        self.flags.get(name)
    }

    pub fn flags(&self) -> impl Iterator<Item = &Flag> {
        self.flags.values()
    }

    pub fn pipeline(&self, name: &str) -> Option<&ModifierPipeline> {
        self.pipelines.get(name)
    }

    /// Named pipelines in registration order
    pub fn pipelines(&self) -> impl Iterator<Item = (&str, &ModifierPipeline)> {
        self.pipelines
            .iter()
            .map(|(name, pipeline)| (name.as_str(), pipeline))
    }

    pub fn conversion(&self) -> Option<&Conversion> {
        self.conversion.as_ref()
    }

    pub fn upgrade(&self, id: &str) -> Option<&Upgrade> {
        self.upgrades.get(id)
    }

    pub fn upgrades(&self) -> impl Iterator<Item = &Upgrade> {
        self.upgrades.values()
    }

    pub fn repeatable(&self, id: &str) -> Option<&Repeatable> {
        self.repeatables.get(id)
    }

    pub fn repeatables(&self) -> impl Iterator<Item = &Repeatable> {
        self.repeatables.values()
    }

    pub fn challenge(&self, id: &str) -> Option<&Challenge> {
        self.challenges.get(id)
    }

    pub fn challenges(&self) -> impl Iterator<Item = &Challenge> {
        self.challenges.values()
    }

    /// Every sticky visibility in the layer
    pub fn visibilities(&self) -> Vec<&Visibility> {
        self.upgrades
            .values()
            .map(Upgrade::visibility)
            .chain(self.repeatables.values().map(Repeatable::visibility))
            .chain(self.challenges.values().map(Challenge::visibility))
            .chain(self.visibilities.iter())
            .collect()
    }

    /// Run the update handler, if any
    pub fn update(&self, ctx: &TickContext) {
        if let Some(handler) = &self.update {
            handler(ctx);
        }
    }

    /// What a reset of this layer clears right now
    pub fn manifest(&self) -> Vec<Box<dyn Resettable>> {
        match &self.manifest {
            Some(manifest) => manifest(),
            None => self.persisted_items(),
        }
    }

    /// Every persisted item, regardless of the manifest
    pub fn persisted_items(&self) -> Vec<Box<dyn Resettable>> {
        let mut items: Vec<Box<dyn Resettable>> = Vec::new();
        for resource in self.resources.values().filter(|r| r.is_persisted()) {
            items.push(Box::new(resource.clone()));
        }
        for flag in self.flags.values() {
            items.push(Box::new(flag.clone()));
        }
        for upgrade in self.upgrades.values() {
            items.push(Box::new(upgrade.clone()));
        }
        for repeatable in self.repeatables.values() {
            items.push(Box::new(repeatable.clone()));
        }
        for challenge in self.challenges.values() {
            items.push(Box::new(challenge.clone()));
        }
        if let Some(tracker) = self.conversion.as_ref().and_then(Conversion::tracker) {
            items.push(Box::new(tracker.clone()));
        }
        items
    }

    /// Reset everything in the manifest, returning the labels cleared
    pub fn reset(&self) -> Vec<String> {
        Self::clear(self.manifest())
    }

    /// Reset every persisted item and drop visibility latches
    pub fn hard_reset(&self) -> Vec<String> {
        let cleared = Self::clear(self.persisted_items());
        for visibility in self.visibilities() {
            visibility.clear();
        }
        cleared
    }

    fn clear(items: Vec<Box<dyn Resettable>>) -> Vec<String> {
        items
            .iter()
            .map(|item| {
                item.reset();
                item.label()
            })
            .collect()
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("resources", &self.resources.keys().collect::<Vec<_>>())
            .field("upgrades", &self.upgrades.keys().collect::<Vec<_>>())
            .field("repeatables", &self.repeatables.keys().collect::<Vec<_>>())
            .field("challenges", &self.challenges.keys().collect::<Vec<_>>())
            .finish()
    }
}
