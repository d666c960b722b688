//! Hypercycles, converted from Cycles

use super::{hook, CyclesLayer, Layers};
use prestige_core::{Conversion, Decimal, Formula, Layer, Requirement, Resettable, Resource, Upgrade};
use std::rc::{Rc, Weak};

pub const ID: &str = "hc";

pub struct HypercyclesLayer {
    pub points: Resource,
    pub conversion: Conversion,
    /// Hypercyclic Points
    pub upg11: Upgrade,
    /// Branching Fractures
    pub upg12: Upgrade,
    /// Extra Super Cycles
    pub upg13: Upgrade,
    /// Finally Broken: breaks Cycles and keeps its challenge completions
    pub upg14: Upgrade,
    /// Hypercyclic Mastery
    pub upg15: Upgrade,
}

impl HypercyclesLayer {
    pub(crate) fn new(game: &Weak<Layers>, cycles: &CyclesLayer) -> Self {
        let points = Resource::new("hypercycles", 0);
        let conversion = Conversion::new(&cycles.points, &points, |x| {
            x.max(0).div(50000).pow(0.1)
        });
        let upgrade = |id: &str, cost: i32| Upgrade::new(id, vec![Requirement::cost(&points, cost)]);

        let upg11 = upgrade("upg11", 1);
        let upg12 = upgrade("upg12", 5);
        let upg13 = upgrade("upg13", 10);
        let upg14 = upgrade("upg14", 25).on_purchase(hook(game, |g| {
            g.cycles.broken.set(true);
            g.broken.points.set(1);
        }));
        let upg15 = upgrade("upg15", 5000);

        Self {
            points,
            conversion,
            upg11,
            upg12,
            upg13,
            upg14,
            upg15,
        }
    }

    pub fn upgrades(&self) -> [&Upgrade; 5] {
        [&self.upg11, &self.upg12, &self.upg13, &self.upg14, &self.upg15]
    }
}

impl Layers {
    pub fn hypercyclic_points_effect(&self) -> Decimal {
        if self.cycles.chal12.is_active() {
            return Decimal::ONE;
        }
        Formula::variable(self.cycles.points.value() + 1)
            .pow(0.3)
            .add(1)
            .step(100, |f| f.pow(0.3))
            .evaluate()
    }

    pub fn branching_fractures_effect(&self) -> Decimal {
        (self.cycles.buy11.owned() + 1).pow(0.25)
    }

    pub fn extra_super_cycles_effect(&self) -> Decimal {
        if self.cycles.chal12.is_active() {
            return Decimal::ZERO;
        }
        Formula::variable(self.hypercycles.points.value() + 1)
            .pow(0.05)
            .log(2)
            .step(2, |f| f.pow(0.5))
            .evaluate()
    }

    pub fn hypercyclic_mastery_effect(&self) -> Decimal {
        (self.hypercycles.points.value() + 1).pow(0.2).log(3) + 1
    }

    /// Everything in the layer
    pub fn hypercycles_manifest(&self) -> Vec<Box<dyn Resettable>> {
        let hypercycles = &self.hypercycles;
        let mut items: Vec<Box<dyn Resettable>> = vec![Box::new(hypercycles.points.clone())];
        for upgrade in hypercycles.upgrades() {
            items.push(Box::new(upgrade.clone()));
        }
        items
    }
}

pub(crate) fn layer(game: &Rc<Layers>) -> Layer {
    let hypercycles = &game.hypercycles;
    let manifest = Rc::clone(game);
    let mut layer = Layer::new(ID, "Hypercycles")
        .with_resource(&hypercycles.points)
        .with_conversion(hypercycles.conversion.clone())
        .with_manifest(move || manifest.hypercycles_manifest());
    for upgrade in hypercycles.upgrades() {
        layer = layer.with_upgrade(upgrade);
    }
    layer
}
