//! Ouroboros: a single trial that restarts the run without the broken state

use super::{condition, hook, reset_items, Layers};
use prestige_core::{Challenge, Decimal, Layer, Requirement, Resettable, Resource};
use std::rc::{Rc, Weak};

pub const ID: &str = "o";

pub struct OuroborosLayer {
    pub points: Resource,
    /// Primitive Self-Eating Snake
    pub trial_one: Challenge,
}

impl OuroborosLayer {
    pub(crate) fn new(game: &Weak<Layers>) -> Self {
        let points = Resource::new("ouroboros trials", 0);
        let rewarded = points.clone();
        let trial_one = Challenge::new(
            "trial1",
            vec![Requirement::condition(condition(game, |g| {
                g.broken.upg13.is_bought()
            }))],
        )
        .on_enter(hook(game, Layers::enter_trial_one))
        .on_exit(hook(game, |g| g.cycles.broken.set(true)))
        .on_complete(move || rewarded.add(1));

        Self { points, trial_one }
    }
}

impl Layers {
    pub fn trial_one_effect(&self) -> Decimal {
        (self.hypercycles.points.value() + 1).pow(0.25).log(3) + 1
    }

    /// Restart everything below Ouroboros with Cycles unbroken
    fn enter_trial_one(&self) {
        for repeatable in self.cycles.repeatables() {
            repeatable.amount().set(0);
        }
        self.cycles.broken.set(false);
        reset_items(self.hypercycles_manifest());
        reset_items(self.broken_manifest());
        reset_items(self.cycles_manifest());
        self.main.points.set(0);
        tracing::debug!("entered trial one");
    }
}

pub(crate) fn layer(game: &Rc<Layers>) -> Layer {
    let ouroboros = &game.ouroboros;
    let manifest = Rc::clone(game);
    Layer::new(ID, "Ouroboros")
        .with_resource(&ouroboros.points)
        .with_challenge(&ouroboros.trial_one)
        .with_manifest(move || {
            let ouroboros = &manifest.ouroboros;
            vec![
                Box::new(ouroboros.points.clone()) as Box<dyn Resettable>,
                Box::new(ouroboros.trial_one.clone()),
            ]
        })
}
