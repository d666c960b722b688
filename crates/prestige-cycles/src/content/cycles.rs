//! Cycles: the first prestige layer
//!
//! Cycle of Points is the centrepiece. Its multiplier follows a sine wave over
//! the current cycle length, shaped by three pipelines (duration, maximum and
//! minimum) that most other purchases feed into.

use super::{condition, derived, hook, Layers, MainLayer};
use prestige_core::{
    Challenge, Condition, Conversion, Cost, Decimal, Flag, Formula, Layer, Modifier,
    ModifierPipeline, Repeatable, Requirement, Resettable, Resource, Upgrade,
};
use std::rc::{Rc, Weak};

pub const ID: &str = "c";

/// Strength of the broken state once Hypercycles upgrade 14 breaks Cycles
pub struct BrokenEffects {
    /// Exponent on Cycles gain
    pub positive: Resource,
    /// Divisor on most Cycles upgrade effects
    pub negative: Resource,
}

pub struct CyclesLayer {
    pub points: Resource,
    pub cycle_length: Resource,
    pub broken: Flag,
    pub broken_effects: BrokenEffects,
    pub conversion: Conversion,
    /// Point gain multiplier read by the main layer
    pub total_mult: ModifierPipeline,
    /// Cycles gain multiplier
    pub cycle_mult: ModifierPipeline,
    pub cop_duration: ModifierPipeline,
    pub cop_max: ModifierPipeline,
    pub cop_min: ModifierPipeline,
    pub upg11: Upgrade,
    pub upg12: Upgrade,
    pub upg13: Upgrade,
    pub upg14: Upgrade,
    pub upg15: Upgrade,
    pub upg21: Upgrade,
    pub upg22: Upgrade,
    pub upg23: Upgrade,
    pub upg24: Upgrade,
    pub upg25: Upgrade,
    pub buy11: Repeatable,
    pub buy12: Repeatable,
    pub buy13: Repeatable,
    pub chal11: Challenge,
    pub chal12: Challenge,
}

/// Base period of Cycle of Points before the duration pipeline
#[allow(clippy::approx_constant)]
const COP_PERIOD: f64 = 3.14;

fn upgrade(id: &str, points: &Resource, cost: i32) -> Upgrade {
    Upgrade::new(id, vec![Requirement::cost(points, cost)])
}

fn at_least(resource: &Resource, threshold: i32) -> Condition {
    let resource = resource.clone();
    Condition::from_fn(move || resource.value() >= Decimal::from(threshold))
}

/// Zero the listed repeatables
fn clear_amounts(amounts: &[Resource]) -> impl Fn() + 'static {
    let amounts = amounts.to_vec();
    move || {
        for amount in &amounts {
            amount.set(0);
        }
    }
}

impl CyclesLayer {
    pub(crate) fn new(game: &Weak<Layers>, main: &MainLayer) -> Self {
        let points = Resource::new("cycles", 0);
        let cycle_length = Resource::new("cycle length", 0);
        let broken = Flag::named("broken", false);
        let broken_effects = BrokenEffects {
            positive: Resource::new("broken positive", 1.15),
            negative: Resource::new("broken negative", 2),
        };

        let upg11 = upgrade("upg11", &points, 1);
        let upg12 = upgrade("upg12", &points, 5);
        let upg13 = upgrade("upg13", &points, 15);
        let upg14 = upgrade("upg14", &points, 25);
        let upg15 = upgrade("upg15", &points, 30);

        let length = cycle_length.clone();
        let buy11 = Repeatable::new(
            "buy11",
            vec![
                Requirement::cost(&points, Cost::scaling(|x| x.add(1).mul(10))),
                Requirement::condition(condition(game, |g| {
                    g.cop_effect() >= g.fractured_cycle_requirement()
                })),
            ],
        )
        .visible_when(upg15.bought())
        .on_click(move |_| length.set(0));

        let length = cycle_length.clone();
        let fractured = buy11.amount().clone();
        let buy12 = Repeatable::new(
            "buy12",
            vec![Requirement::cost(
                buy11.amount(),
                Cost::scaling(|x| x.add(1).mul(2).div(3).pow(2).add(3.5).ceil()),
            )],
        )
        .with_limit(5)
        .visible_when(at_least(buy11.amount(), 3))
        .on_click(move |_| {
            length.set(0);
            fractured.set(0);
        });

        let length = cycle_length.clone();
        let reset_lower = clear_amounts(&[buy11.amount().clone(), buy12.amount().clone()]);
        let buy13 = Repeatable::new(
            "buy13",
            vec![Requirement::cost(
                buy12.amount(),
                Cost::scaling(|x| x.step(2, |f| f.mul(1.5)).add(4).floor()),
            )],
        )
        .visible_when(condition(game, |g| {
            g.hypercycles.points.value() >= Decimal::from(5)
        }))
        .on_click(move |_| {
            length.set(0);
            reset_lower();
        });

        let amounts = [
            buy11.amount().clone(),
            buy12.amount().clone(),
            buy13.amount().clone(),
        ];

        let chal11 = Challenge::new(
            "chal11",
            vec![Requirement::condition(at_least(buy12.amount(), 2))],
        )
        .on_enter(clear_amounts(&amounts));

        let positive = broken_effects.positive.clone();
        let chal12 = Challenge::new(
            "chal12",
            vec![Requirement::condition(at_least(buy13.amount(), 1))],
        )
        .on_enter(clear_amounts(&amounts))
        .on_complete(move || positive.set(1.3));

        let upg21 = upgrade("upg21", &points, 300).visible_when(at_least(buy12.amount(), 3));
        let five_shards = || at_least(buy12.amount(), 5);
        let upg22 = upgrade("upg22", &points, 500).visible_when(five_shards());
        let upg23 = upgrade("upg23", &points, 1000)
            .visible_when(five_shards())
            .on_purchase(clear_amounts(&amounts));
        let upg24 = upgrade("upg24", &points, 7500).visible_when(five_shards());
        let upg25 = upgrade("upg25", &points, 25000)
            .visible_when(five_shards())
            .on_purchase(hook(game, |g| g.cycles.chal11.visibility().reveal()));

        let chal11 = chal11.visible_when(upg25.bought());
        let chal12 = chal12.visible_when(condition(game, |g| {
            g.hypercycles.points.value() >= Decimal::from(10) && g.cycles.upg23.is_bought()
        }));

        let total_mult = ModifierPipeline::new()
            .with(Modifier::multiplicative(2).when(upg11.bought()).described("Dual Cycle"))
            .with(
                Modifier::multiplicative(derived(game, Layers::cop_effect))
                    .when(upg12.bought())
                    .described("Cycle of Points"),
            )
            .with(
                Modifier::multiplicative(derived(game, Layers::cyclic_points_effect))
                    .when(upg25.bought())
                    .described("Cyclic Points"),
            )
            .with(
                Modifier::multiplicative(derived(game, Layers::hypercyclic_points_effect))
                    .when(condition(game, |g| g.hypercycles.upg11.is_bought()))
                    .described("Hypercyclic Points"),
            );

        let cycle_mult = ModifierPipeline::new()
            .with(
                Modifier::multiplicative(derived(game, Layers::recycled_points_effect))
                    .when(upg22.bought())
                    .described("Recycled Points"),
            )
            .with(
                Modifier::multiplicative(derived(game, Layers::branching_fractures_effect))
                    .when(condition(game, |g| g.hypercycles.upg12.is_bought()))
                    .described("Branching Fractures"),
            )
            .with(
                Modifier::multiplicative(derived(game, Layers::hypercyclic_mastery_effect))
                    .when(condition(game, |g| g.hypercycles.upg15.is_bought()))
                    .described("Hypercyclic Mastery"),
            );

        let cop_duration = ModifierPipeline::new()
            .with(Modifier::multiplicative(6))
            .with(Modifier::multiplicative(2).when(upg14.bought()))
            .with(Modifier::multiplicative(2).when(upg15.bought()))
            .with(Modifier::multiplicative(derived(game, Layers::cyclic_shard_decrease)))
            .with(
                Modifier::multiplicative(derived(game, Layers::shattered_cycle_effect))
                    .when(upg21.bought()),
            );

        let cop_max = ModifierPipeline::new()
            .with(Modifier::additive(-1).when(upg13.bought()))
            .with(Modifier::additive(0.5).when(upg14.bought()))
            .with(Modifier::additive(0.25).when(upg15.bought()))
            .with(Modifier::additive(derived(game, Layers::fractured_cycle_effect)))
            .with(Modifier::multiplicative(0.5).when(chal11.active()))
            .with(
                Modifier::multiplicative(derived(game, |g| g.broken_divisor().recip()))
                    .when(&broken),
            )
            .with(Modifier::exponential(0.75).when(chal12.active()));

        let outside_challenges = || {
            Condition::from(upg23.bought())
                .and(Condition::from(chal11.active()).not())
                .and(Condition::from(chal12.active()).not())
        };
        let cop_min = ModifierPipeline::new()
            .with(Modifier::additive(0.4).when(upg13.bought()))
            .with(Modifier::additive(-1.5).when(outside_challenges()))
            .with(Modifier::additive(1).when(outside_challenges().and(&broken)));

        let conversion = Conversion::new(&main.points, &points, |x| {
            x.max(0)
                .div(10)
                .sqrt()
                .mul(derived(game, Layers::cycle_multiplier))
                .pow(derived(game, Layers::broken_exponent))
        });

        Self {
            points,
            cycle_length,
            broken,
            broken_effects,
            conversion,
            total_mult,
            cycle_mult,
            cop_duration,
            cop_max,
            cop_min,
            upg11,
            upg12,
            upg13,
            upg14,
            upg15,
            upg21,
            upg22,
            upg23,
            upg24,
            upg25,
            buy11,
            buy12,
            buy13,
            chal11,
            chal12,
        }
    }

    pub fn upgrades(&self) -> [&Upgrade; 10] {
        [
            &self.upg11,
            &self.upg12,
            &self.upg13,
            &self.upg14,
            &self.upg15,
            &self.upg21,
            &self.upg22,
            &self.upg23,
            &self.upg24,
            &self.upg25,
        ]
    }

    pub fn repeatables(&self) -> [&Repeatable; 3] {
        [&self.buy11, &self.buy12, &self.buy13]
    }

    pub fn challenges(&self) -> [&Challenge; 2] {
        [&self.chal11, &self.chal12]
    }
}

impl Layers {
    pub fn cycle_multiplier(&self) -> Decimal {
        self.cycles.cycle_mult.apply(1)
    }

    /// Divisor applied to most Cycles effects while broken
    pub fn broken_divisor(&self) -> Decimal {
        let cycles = &self.cycles;
        if cycles.broken.get() {
            cycles.broken_effects.negative.value()
        } else {
            Decimal::ONE
        }
    }

    /// Exponent on Cycles gain while broken
    pub fn broken_exponent(&self) -> Decimal {
        let cycles = &self.cycles;
        if cycles.broken.get() {
            cycles.broken_effects.positive.value()
        } else {
            Decimal::ONE
        }
    }

    fn in_any_challenge(&self) -> bool {
        self.cycles.chal11.is_active() || self.cycles.chal12.is_active()
    }

    /// Cycle of Points multiplier
    pub fn cop_effect(&self) -> Decimal {
        let cycles = &self.cycles;
        let length = cycles.cycle_length.value();
        let duration = cycles.cop_duration.apply(COP_PERIOD);
        let maximum = cycles.cop_max.apply(3);
        let minimum = cycles.cop_min.apply(0.1);
        let exponent = if cycles.upg23.is_bought() {
            self.supercycle_effect()
        } else {
            Decimal::ONE
        };

        let phase = length / duration;
        let mut effect = (phase.sin() * maximum).abs().pow(exponent) + minimum;
        if self.broken.upg11.is_bought() {
            effect += (phase.cos() * maximum).abs().pow(exponent);
        }
        effect
    }

    pub fn shattered_cycle_effect(&self) -> Decimal {
        let base = (self.cycles.points.value() + 1).pow(0.1) + 0.5;
        (base.recip() * self.broken_divisor()).min(1)
    }

    pub fn recycled_points_effect(&self) -> Decimal {
        let cap = if self.cycles.chal11.is_active() {
            Decimal::from(2)
        } else {
            Decimal::pow10(1e10)
        };
        let base = ((self.main.points.value() + 1).max(1).pow(0.2) / 3 + 1).min(cap);
        Formula::variable(base)
            .step(1e6, |f| f.pow(0.5))
            .div(self.broken_divisor())
            .max(1)
            .evaluate()
    }

    /// Exponent on Cycle of Points
    pub fn supercycle_effect(&self) -> Decimal {
        if self.in_any_challenge() {
            return Decimal::ONE;
        }
        let mut base = Decimal::ONE;
        if self.cycles.upg23.is_bought() {
            base += 1;
        }
        if self.cycles.chal11.completion_count() >= Decimal::ONE {
            base += 1;
        }
        if self.hypercycles.upg13.is_bought() {
            base += self.extra_super_cycles_effect();
        }
        (base / self.broken_divisor()).max(1)
    }

    pub fn pointed_shards_effect(&self) -> Decimal {
        let base = self.main.points.value().max(1).pow(0.2) / 5;
        Formula::variable(base)
            .add(1)
            .step(1e7, |f| f.pow(0.5))
            .div(self.broken_divisor())
            .max(1)
            .evaluate()
    }

    fn pointed_shards_multiplier(&self) -> Decimal {
        if self.cycles.upg24.is_bought() {
            self.pointed_shards_effect()
        } else {
            Decimal::ONE
        }
    }

    pub fn cyclic_points_effect(&self) -> Decimal {
        let base = self.cycles.points.value().max(1).pow(0.25) / 3;
        Formula::variable(base)
            .add(1)
            .step(5e5, |f| f.pow(0.4))
            .div(self.broken_divisor())
            .evaluate()
    }

    /// Cycle of Points value needed before another Fractured Cycle
    pub fn fractured_cycle_requirement(&self) -> Decimal {
        let cycles = &self.cycles;
        let owned = cycles.buy11.owned();
        let spread = if owned >= Decimal::from(40) { 50 } else { 5 };
        let base = Decimal::from(1.7)
            - (self.cyclic_shard_increase() / self.pointed_shards_multiplier() + 1) / spread;

        let mut amount = Formula::variable(owned)
            .pow_base(base)
            .add(2)
            .step(20, |f| f.pow(3))
            .step(8e6, |g| g.pow(4))
            .evaluate();
        if cycles.chal11.is_active() {
            amount /= 2;
        }
        amount /= self.broken_divisor();
        if cycles.chal12.is_active() {
            amount = amount.pow(0.75);
        }
        amount
    }

    /// Bonus repeatable levels from Loop of Trials
    pub fn trial_bonus(&self) -> Decimal {
        if self.cycles.chal12.completion_count() < Decimal::ONE {
            return Decimal::ZERO;
        }
        let from_cycles = (self.cycles.points.value() + 1).pow(0.1).log(5);
        Formula::variable((self.hypercycles.points.value() + 1).pow(0.2))
            .log(3)
            .add(from_cycles)
            .step(3, |f| f.pow(0.5))
            .evaluate()
    }

    pub fn fractured_cycle_effect(&self) -> Decimal {
        (self.cycles.buy11.owned() + self.trial_bonus()) * (self.cyclic_shard_increase() + 1)
    }

    pub fn cyclic_shard_decrease(&self) -> Decimal {
        let base = self.cycles.buy12.owned() + self.trial_bonus();
        (base / 5 + 1).recip()
    }

    pub fn cyclic_shard_increase(&self) -> Decimal {
        let base = self.cycles.buy12.owned() + self.trial_bonus();
        (base / 3 + self.fragmented_cycles_effect()) * self.pointed_shards_multiplier()
    }

    pub fn fragmented_cycles_effect(&self) -> Decimal {
        (self.cycles.buy13.owned() + 1 + self.trial_bonus())
            .pow(0.5)
            .log(2)
    }

    /// What a Cycles reset clears
    ///
    /// Challenge completions survive once Hypercycles upgrade 14 is bought.
    pub fn cycles_manifest(&self) -> Vec<Box<dyn Resettable>> {
        let cycles = &self.cycles;
        let mut items: Vec<Box<dyn Resettable>> = vec![Box::new(cycles.points.clone())];
        for upgrade in cycles.upgrades() {
            items.push(Box::new(upgrade.clone()));
        }
        for repeatable in cycles.repeatables() {
            items.push(Box::new(repeatable.clone()));
        }
        if !self.hypercycles.upg14.is_bought() {
            for challenge in cycles.challenges() {
                items.push(Box::new(challenge.clone()));
            }
        }
        items
    }

    fn advance_cycles(&self, diff: Decimal) {
        let cycles = &self.cycles;
        cycles.cycle_length.add(diff);
        if cycles.chal11.completion_count() >= Decimal::ONE {
            cycles.points.add(cycles.conversion.current_gain() * diff / 10);
        }
    }
}

pub(crate) fn layer(game: &Rc<Layers>) -> Layer {
    let cycles = &game.cycles;
    let updater = Rc::clone(game);
    let manifest = Rc::clone(game);
    let mut layer = Layer::new(ID, "Cycles")
        .with_resource(&cycles.points)
        .with_resource(&cycles.cycle_length)
        .with_resource(&cycles.broken_effects.positive)
        .with_resource(&cycles.broken_effects.negative)
        .with_flag(&cycles.broken)
        .with_pipeline("point gain", cycles.total_mult.clone())
        .with_pipeline("cycle gain", cycles.cycle_mult.clone())
        .with_conversion(cycles.conversion.clone())
        .on_update(move |ctx| updater.advance_cycles(ctx.diff))
        .with_manifest(move || manifest.cycles_manifest());
    for upgrade in cycles.upgrades() {
        layer = layer.with_upgrade(upgrade);
    }
    for repeatable in cycles.repeatables() {
        layer = layer.with_repeatable(repeatable);
    }
    for challenge in cycles.challenges() {
        layer = layer.with_challenge(challenge);
    }
    layer
}
