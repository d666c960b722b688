//! The assembled game: layers, reset tree and scheduler

use crate::content::{self, Layers};
use crate::error::{Error, Result};
use prestige_core::{
    CascadePolicy, Decimal, EngineConfig, LayerId, LayerRegistry, Purchasable, ResetReport,
    ResetTree, Scheduler, Snapshot, TreeNode,
};
use std::rc::Rc;

/// The tree has no edges, so a prestige never resets another layer
pub const RESET_POLICY: CascadePolicy = CascadePolicy::DownstreamByRank;

/// A running game of Cycles
pub struct CyclesGame {
    layers: Rc<Layers>,
    registry: LayerRegistry,
    tree: ResetTree,
    scheduler: Scheduler,
    config: EngineConfig,
}

impl CyclesGame {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let layers = Layers::new();
        let mut registry = LayerRegistry::new();
        layers.register(&mut registry)?;
        let tree = reset_tree(&layers)?;
        Ok(Self {
            layers,
            registry,
            tree,
            scheduler: Scheduler::new(config),
            config: config.clone(),
        })
    }

    pub fn layers(&self) -> &Layers {
        &self.layers
    }

    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    pub fn tree(&self) -> &ResetTree {
        &self.tree
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    /// Advance by `real_diff` seconds of wall time
    pub fn tick(&mut self, real_diff: f64) -> Option<Decimal> {
        self.scheduler.tick(real_diff, &self.registry)
    }

    /// Press a layer's reset button: convert, then reseed points
    pub fn prestige(&self, layer: &str) -> Result<ResetReport> {
        let id = LayerId::from(layer);
        if self.tree.node(&id).is_none() {
            return Err(Error::UnknownLayer(layer.to_string()));
        }
        let report = self.registry.prestige(&id, &self.tree, RESET_POLICY)?;
        tracing::info!(layer, targets = report.targets.len(), "prestige");
        Ok(report)
    }

    /// Buy every visible, affordable upgrade and repeatable, in layer order
    ///
    /// Returns the number of levels bought.
    pub fn buy_all(&self) -> Decimal {
        let mut bought = Decimal::ZERO;
        for layer in self.registry.active_layers() {
            for upgrade in layer.upgrades() {
                bought += upgrade.purchase();
            }
            for repeatable in layer.repeatables() {
                bought += repeatable.purchase();
            }
        }
        bought
    }

    pub fn has_won(&self) -> bool {
        self.layers.has_won()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.registry, self.scheduler.clock())
    }

    /// Load a save, keeping the current speed and pause state
    pub fn restore(&mut self, snapshot: &Snapshot) {
        let clock = snapshot.restore(&self.registry);
        let speed = self.scheduler.speed();
        let mut scheduler = Scheduler::new(&self.config).with_clock(clock);
        scheduler.set_speed(speed);
        self.scheduler = scheduler;
    }

    /// Wipe every layer back to a new game
    pub fn hard_reset(&mut self) {
        self.tree.hard_reset(&self.registry);
        self.scheduler = Scheduler::new(&self.config);
    }
}

/// Rows `[c] / [hc, bc] / [o]` with no edges; a reset never cascades
///
/// Points restart at 0 after a Cycles reset and at 10 after any other.
fn reset_tree(layers: &Layers) -> Result<ResetTree> {
    let mut tree = ResetTree::new();
    tree.add_node(TreeNode::root(content::cycles::ID, 1))?;
    tree.add_node(TreeNode::root(content::hypercycles::ID, 2))?;
    tree.add_node(TreeNode::root(content::broken::ID, 2))?;
    tree.add_node(TreeNode::root(content::ouroboros::ID, 3))?;
    Ok(tree.with_reseed(
        &layers.main.points,
        Some(&layers.main.tracker),
        |id: &LayerId| {
            if id.as_str() == content::cycles::ID {
                Decimal::ZERO
            } else {
                Decimal::from(10)
            }
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_layout() {
        let game = CyclesGame::new(&EngineConfig::default()).unwrap();
        let ids: Vec<_> = game.registry().ids().map(LayerId::as_str).collect();
        assert_eq!(ids, vec!["main", "c", "hc", "bc", "o"]);
        assert_eq!(game.tree().nodes().count(), 4);
    }

    #[test]
    fn test_prestige_unknown_layer() {
        let game = CyclesGame::new(&EngineConfig::default()).unwrap();
        assert!(matches!(game.prestige("main"), Err(Error::UnknownLayer(_))));
        assert!(matches!(game.prestige("zz"), Err(Error::UnknownLayer(_))));
    }

    #[test]
    fn test_first_seconds_of_play() {
        let mut game = CyclesGame::new(&EngineConfig::default()).unwrap();
        for _ in 0..100 {
            game.tick(0.1);
        }
        let points = game.layers().main.points.value();
        assert!(points.approx_eq(10, 1e-9));
        assert!(game.layers().cycles.conversion.current_gain().approx_eq(1, 1e-9));
        assert!(!game.has_won());
    }

    #[test]
    fn test_hard_reset_restarts_clock() {
        let mut game = CyclesGame::new(&EngineConfig::default()).unwrap();
        game.tick(5.0);
        game.layers().cycles.upg25.visibility().reveal();
        game.hard_reset();
        assert_eq!(game.scheduler().clock().tick, 0);
        assert_eq!(game.layers().main.points.value(), Decimal::ZERO);
        assert!(!game.layers().cycles.upg25.visibility().is_revealed());
    }
}
