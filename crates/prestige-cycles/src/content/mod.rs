//! Layer content of the Cycles game
//!
//! All layer state lives in one [`Layers`] value built with
//! [`Rc::new_cyclic`], so effects can read across layers in any direction.
//! Closures stored inside the layers hold a [`Weak`] back-reference and read
//! a neutral value once the game is dropped.

pub mod broken;
pub mod cycles;
pub mod hypercycles;
pub mod ouroboros;
pub mod points;

pub use broken::BrokenCyclesLayer;
pub use cycles::{BrokenEffects, CyclesLayer};
pub use hypercycles::HypercyclesLayer;
pub use ouroboros::OuroborosLayer;
pub use points::MainLayer;

use crate::Result;
use prestige_core::{Condition, Decimal, LayerRegistry, Resettable, Source};
use std::rc::{Rc, Weak};

/// Every layer of the game, in tick order
pub struct Layers {
    pub main: MainLayer,
    pub cycles: CyclesLayer,
    pub hypercycles: HypercyclesLayer,
    pub broken: BrokenCyclesLayer,
    pub ouroboros: OuroborosLayer,
}

impl Layers {
    pub fn new() -> Rc<Self> {
        Rc::new_cyclic(|game| {
            let main = MainLayer::new();
            let cycles = CyclesLayer::new(game, &main);
            let hypercycles = HypercyclesLayer::new(game, &cycles);
            let broken = BrokenCyclesLayer::new(game, &cycles, &hypercycles);
            let ouroboros = OuroborosLayer::new(game);
            Self {
                main,
                cycles,
                hypercycles,
                broken,
                ouroboros,
            }
        })
    }

    /// Register every layer; registration order is tick order
    pub fn register(self: &Rc<Self>, registry: &mut LayerRegistry) -> Result<()> {
        registry.register(points::layer(self))?;
        registry.register(cycles::layer(self))?;
        registry.register(hypercycles::layer(self))?;
        registry.register(broken::layer(self))?;
        registry.register(ouroboros::layer(self))?;
        Ok(())
    }

    /// The game ends with the first Cycle of Difficulties completion
    pub fn has_won(&self) -> bool {
        self.cycles.chal11.completion_count() >= Decimal::ONE
    }
}

/// A value recomputed from the game on every read
pub(crate) fn derived(game: &Weak<Layers>, f: fn(&Layers) -> Decimal) -> Source {
    let game = game.clone();
    Source::computed(move || game.upgrade().map_or(Decimal::ZERO, |layers| f(&layers)))
}

/// A condition read from the game on every check
pub(crate) fn condition(game: &Weak<Layers>, f: fn(&Layers) -> bool) -> Condition {
    let game = game.clone();
    Condition::from_fn(move || game.upgrade().is_some_and(|layers| f(&layers)))
}

/// A purchase or challenge hook acting on the game
pub(crate) fn hook(game: &Weak<Layers>, f: fn(&Layers)) -> impl Fn() + 'static {
    let game = game.clone();
    move || {
        if let Some(layers) = game.upgrade() {
            f(&layers);
        }
    }
}

pub(crate) fn reset_items(items: Vec<Box<dyn Resettable>>) {
    for item in items {
        item.reset();
    }
}
