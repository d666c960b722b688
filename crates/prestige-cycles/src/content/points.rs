//! Points, the root resource every other layer converts from

use super::Layers;
use prestige_core::{Decimal, Layer, Resource, Tracker};
use std::rc::Rc;

pub const ID: &str = "main";

pub struct MainLayer {
    pub points: Resource,
    pub tracker: Tracker,
}

impl MainLayer {
    pub(crate) fn new() -> Self {
        let points = Resource::new("points", 0);
        let tracker = Tracker::new(&points);
        Self { points, tracker }
    }
}

impl Layers {
    /// Points per second
    pub fn point_gain(&self) -> Decimal {
        self.cycles.total_mult.apply(1)
    }

    fn produce_points(&self, diff: Decimal) {
        let gained = self.point_gain() * diff;
        self.main.points.add(gained);
        self.main.tracker.record(&self.main.points, gained);
    }
}

pub(crate) fn layer(game: &Rc<Layers>) -> Layer {
    let main = &game.main;
    let producer = Rc::clone(game);
    Layer::new(ID, "Tree")
        .with_resource(&main.points)
        .with_resource(&main.tracker.best)
        .with_resource(&main.tracker.total)
        .on_update(move |ctx| producer.produce_points(ctx.diff))
}
