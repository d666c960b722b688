//! Broken Cycles, unlocked when Hypercycles upgrade 14 breaks Cycles
//!
//! Corrupted Upgrades opens a grid of toggles. Each toggle moves the negative
//! broken effect by a fixed step and resets the Cycles layer.

use super::{condition, derived, reset_items, CyclesLayer, HypercyclesLayer, Layers};
use prestige_core::{Conversion, Flag, Layer, Requirement, Resettable, Resource, Upgrade};
use std::rc::{Rc, Weak};

pub const ID: &str = "bc";

pub const GRID_ROWS: usize = 2;
pub const GRID_COLS: usize = 5;

/// Change to the negative broken effect per toggle
const TOGGLE_STEP: f64 = 0.075;

pub struct BrokenCyclesLayer {
    pub points: Resource,
    pub conversion: Conversion,
    /// Misalignment: adds a cosine wave to Cycle of Points
    pub upg11: Upgrade,
    /// Fragmenting Shards
    pub upg12: Upgrade,
    /// Corrupted Upgrades: unlocks the disable grid
    pub upg13: Upgrade,
    /// Row-major; `true` means the matching Cycles upgrade is enabled
    pub grid: Vec<Flag>,
}

impl BrokenCyclesLayer {
    pub(crate) fn new(
        game: &Weak<Layers>,
        cycles: &CyclesLayer,
        hypercycles: &HypercyclesLayer,
    ) -> Self {
        let points = Resource::new("broken cycles", 0);
        let conversion = Conversion::new(&cycles.points, &points, |x| {
            x.max(0)
                .div(5e6)
                .pow(0.15)
                .mul(derived(game, Layers::trial_one_effect))
        })
        // Hypercycles feed the layer while trial one is active
        .alternate(
            condition(game, |g| g.ouroboros.trial_one.is_active()),
            &hypercycles.points,
            |x| x.max(0).div(10).pow(0.5),
        );
        let upgrade = |id: &str, cost: i32| Upgrade::new(id, vec![Requirement::cost(&points, cost)]);
        let upg11 = upgrade("upg11", 2);
        let upg12 = upgrade("upg12", 3);
        let upg13 = upgrade("upg13", 5);

        let grid = (1..=GRID_ROWS)
            .flat_map(|row| (1..=GRID_COLS).map(move |col| (row, col)))
            .map(|(row, col)| Flag::named(format!("cell {row}{col}"), true))
            .collect();

        Self {
            points,
            conversion,
            upg11,
            upg12,
            upg13,
            grid,
        }
    }

    pub fn upgrades(&self) -> [&Upgrade; 3] {
        [&self.upg11, &self.upg12, &self.upg13]
    }

    /// Grid cell by one-based row and column
    pub fn cell(&self, row: usize, col: usize) -> Option<&Flag> {
        if !(1..=GRID_ROWS).contains(&row) || !(1..=GRID_COLS).contains(&col) {
            return None;
        }
        self.grid.get((row - 1) * GRID_COLS + (col - 1))
    }
}

impl Layers {
    /// Flip a grid cell, adjust the negative broken effect and reset Cycles
    ///
    /// Returns `false` when the grid is locked or the cell does not exist.
    pub fn toggle_grid_cell(&self, row: usize, col: usize) -> bool {
        if !self.broken.upg13.is_bought() {
            return false;
        }
        let Some(cell) = self.broken.cell(row, col) else {
            return false;
        };
        let negative = &self.cycles.broken_effects.negative;
        if cell.get() {
            negative.sub(TOGGLE_STEP);
        } else {
            negative.add(TOGGLE_STEP);
        }
        cell.set(!cell.get());
        tracing::debug!(row, col, enabled = cell.get(), negative = %negative.value(), "grid cell toggled");
        reset_items(self.cycles_manifest());
        true
    }

    /// Everything in the layer, grid included
    pub fn broken_manifest(&self) -> Vec<Box<dyn Resettable>> {
        let broken = &self.broken;
        let mut items: Vec<Box<dyn Resettable>> = vec![Box::new(broken.points.clone())];
        for upgrade in broken.upgrades() {
            items.push(Box::new(upgrade.clone()));
        }
        for cell in &broken.grid {
            items.push(Box::new(cell.clone()));
        }
        items
    }
}

pub(crate) fn layer(game: &Rc<Layers>) -> Layer {
    let broken = &game.broken;
    let manifest = Rc::clone(game);
    let mut layer = Layer::new(ID, "Broken Cycles")
        .with_resource(&broken.points)
        .with_conversion(broken.conversion.clone())
        .with_manifest(move || manifest.broken_manifest());
    for upgrade in broken.upgrades() {
        layer = layer.with_upgrade(upgrade);
    }
    for cell in &broken.grid {
        layer = layer.with_flag(cell);
    }
    layer
}
