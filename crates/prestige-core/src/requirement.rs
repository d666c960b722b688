//! Purchase requirements and bulk affordability
//!
//! A purchase is gated by a list of [`Requirement`]s. Cost requirements solve
//! for how many levels the resource can cover; boolean requirements only gate.
//! Every query takes `owned`, the number of levels already bought, because
//! scaling costs are formulas over that amount.

use crate::formula::search;
use crate::{Condition, Decimal, EngineConfig, Formula, Resource, SearchConfig, Source};

/// How much one level costs
#[derive(Debug, Clone)]
pub enum Cost {
    /// The same price for every level
    Fixed(Source),
    /// A formula over the number of levels already owned
    Scaling(Formula),
}

impl Cost {
    /// A scaling cost; `formula` receives the owned amount as its variable
    pub fn scaling(formula: impl FnOnce(Formula) -> Formula) -> Self {
        Cost::Scaling(formula(Formula::variable(Decimal::ZERO)))
    }

    /// Price of the level bought when `owned` levels are held
    pub fn at(&self, owned: impl Into<Decimal>) -> Decimal {
        match self {
            Cost::Fixed(source) => source.get(),
            Cost::Scaling(formula) => formula.evaluate_at(owned),
        }
    }
}

impl From<Formula> for Cost {
    fn from(formula: Formula) -> Self {
        Cost::Scaling(formula)
    }
}

impl From<Source> for Cost {
    fn from(source: Source) -> Self {
        Cost::Fixed(source)
    }
}

impl From<f64> for Cost {
    fn from(value: f64) -> Self {
        Cost::Fixed(value.into())
    }
}

impl From<i32> for Cost {
    fn from(value: i32) -> Self {
        Cost::Fixed(value.into())
    }
}

impl From<Decimal> for Cost {
    fn from(value: Decimal) -> Self {
        Cost::Fixed(value.into())
    }
}

/// Requires a resource to cover a cost
#[derive(Debug, Clone)]
pub struct CostRequirement {
    resource: Resource,
    cost: Cost,
    requires_pay: bool,
    cumulative: bool,
    search: SearchConfig,
    direct_sum_limit: u32,
}

impl CostRequirement {
    /// A paid, non-cumulative cost
    pub fn new(resource: &Resource, cost: impl Into<Cost>) -> Self {
        let defaults = EngineConfig::default();
        Self {
            resource: resource.clone(),
            cost: cost.into(),
            requires_pay: true,
            cumulative: false,
            search: defaults.search,
            direct_sum_limit: defaults.direct_sum_limit,
        }
    }

    /// Bulk purchases pay the sum of every level's cost
    pub fn cumulative(mut self) -> Self {
        self.cumulative = true;
        self
    }

    /// Only check the resource; purchasing leaves it untouched
    pub fn without_pay(mut self) -> Self {
        self.requires_pay = false;
        self
    }

    /// Take search limits from an engine config
    pub fn configured(mut self, config: &EngineConfig) -> Self {
        self.search = config.search;
        self.direct_sum_limit = config.direct_sum_limit;
        self
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn cost(&self) -> &Cost {
        &self.cost
    }

    /// Whether the next level is affordable
    pub fn is_satisfied(&self, owned: Decimal) -> bool {
        self.resource.value() >= self.cost.at(owned)
    }

    /// How many more levels the resource covers
    pub fn max_affordable(&self, owned: Decimal) -> Decimal {
        let available = self.resource.value();
        if self.cumulative {
            self.max_cumulative(owned, available)
        } else {
            self.max_single(owned, available)
        }
    }

    /// Deduct the price of `amount` levels bought on top of `owned`
    pub fn pay(&self, owned: Decimal, amount: Decimal) {
        if !self.requires_pay || !amount.is_positive() {
            return;
        }
        let price = if self.cumulative {
            self.cost_sum(owned, amount)
        } else {
            self.cost.at(owned + amount - 1)
        };
        self.resource.set((self.resource.value() - price).max(0));
    }

    /// Highest level whose own price fits, counted from `owned`
    fn max_single(&self, owned: Decimal, available: Decimal) -> Decimal {
        let formula = match &self.cost {
            Cost::Fixed(source) => {
                return if available >= source.get() {
                    Decimal::INFINITY
                } else {
                    Decimal::ZERO
                };
            }
            Cost::Scaling(formula) => formula,
        };
        if available < formula.evaluate_at(owned) {
            return Decimal::ZERO;
        }

        let affordable = |level: Decimal| formula.evaluate_at(level) <= available;
        let highest = match formula.invert(available) {
            Some(level) if level.is_finite() => {
                // float error can land just below an exact level
                let level = level.floor().max(owned);
                if affordable(level + 1) {
                    level + 1
                } else if affordable(level) {
                    level
                } else {
                    level - 1
                }
            }
            _ => search::bisect_integer(
                affordable,
                owned,
                self.search.upper_bound,
                self.search.max_iterations,
            )
            .unwrap_or(owned - 1),
        };
        (highest - owned + 1).max(0)
    }

    /// Most levels whose summed price fits
    fn max_cumulative(&self, owned: Decimal, available: Decimal) -> Decimal {
        if let Cost::Fixed(source) = &self.cost {
            let price = source.get();
            if !price.is_positive() {
                return Decimal::INFINITY;
            }
            return (available / price).floor().max(0);
        }
        // no single level past this bound fits, so neither can a sum ending there
        let ceiling = self.max_single(owned, available);
        if !ceiling.is_positive() {
            return Decimal::ZERO;
        }
        let ceiling = ceiling.min(self.search.upper_bound);
        search::bisect_integer(
            |count| self.cost_sum(owned, count) <= available,
            Decimal::ZERO,
            ceiling,
            self.search.max_iterations,
        )
        .unwrap_or(Decimal::ZERO)
    }

    /// Price of `count` levels starting at `owned`
    ///
    /// Up to `direct_sum_limit` levels are summed one by one. Past that, a
    /// cost that grows by a constant ratio uses the geometric series; any other
    /// cost sums its dearest `direct_sum_limit` levels exactly and prices the
    /// cheaper rest chunk by chunk at each chunk's middle level.
    fn cost_sum(&self, owned: Decimal, count: Decimal) -> Decimal {
        if !count.is_positive() {
            return Decimal::ZERO;
        }
        if let Cost::Fixed(source) = &self.cost {
            return source.get() * count;
        }
        let limit = self.direct_sum_limit.max(1);
        if count <= Decimal::from(limit) {
            return self.exact_sum(owned, count.to_f64() as u32);
        }
        if let Some(total) = self.geometric_sum(owned, count) {
            return total;
        }

        let estimated = count - limit;
        let mut total = self.exact_sum(owned + estimated, limit);
        let chunks = estimated.min(limit);
        let mut start = Decimal::ZERO;
        for chunk in 1..=chunks.to_f64() as u32 {
            let end = (estimated * chunk / chunks).floor();
            let width = end - start;
            if width.is_positive() {
                total += self.cost.at(owned + start + (width - 1) / 2) * width;
            }
            start = end;
        }
        total
    }

    fn exact_sum(&self, owned: Decimal, count: u32) -> Decimal {
        (0..count).fold(Decimal::ZERO, |total, offset| {
            total + self.cost.at(owned + offset)
        })
    }

    /// Closed-form sum when sampled levels grow by one constant ratio
    fn geometric_sum(&self, owned: Decimal, count: Decimal) -> Option<Decimal> {
        let first = self.cost.at(owned);
        if !first.is_positive() || !first.is_finite() {
            return None;
        }
        let ratio = self.cost.at(owned + 1) / first;
        if !ratio.is_positive() || !ratio.is_finite() {
            return None;
        }
        let last = count - 1;
        let fits = (0..=GEOMETRIC_SAMPLES).all(|sample| {
            let offset = (last * sample / GEOMETRIC_SAMPLES).floor();
            self.cost
                .at(owned + offset)
                .approx_eq(first * ratio.pow(offset), GEOMETRIC_TOLERANCE)
        });
        if !fits {
            return None;
        }
        if ratio.approx_eq(1, GEOMETRIC_TOLERANCE) {
            return Some(first * count);
        }
        Some(first * (ratio.pow(count) - 1) / (ratio - 1))
    }
}

/// Evenly spaced levels checked before trusting the geometric series
const GEOMETRIC_SAMPLES: u32 = 16;
const GEOMETRIC_TOLERANCE: f64 = 1e-9;

/// A gate that needs no payment
#[derive(Debug, Clone)]
pub struct BooleanRequirement(pub Condition);

impl BooleanRequirement {
    pub fn new(condition: impl Into<Condition>) -> Self {
        Self(condition.into())
    }
}

/// Anything that gates a purchase
#[derive(Debug, Clone)]
pub enum Requirement {
    Cost(CostRequirement),
    Boolean(BooleanRequirement),
}

impl Requirement {
    /// Shorthand for a paid, non-cumulative cost
    pub fn cost(resource: &Resource, cost: impl Into<Cost>) -> Self {
        Requirement::Cost(CostRequirement::new(resource, cost))
    }

    /// Shorthand for a boolean gate
    pub fn condition(condition: impl Into<Condition>) -> Self {
        Requirement::Boolean(BooleanRequirement::new(condition))
    }

    /// Whether the next level may be bought
    pub fn is_satisfied(&self, owned: Decimal) -> bool {
        match self {
            Requirement::Cost(cost) => cost.is_satisfied(owned),
            Requirement::Boolean(BooleanRequirement(condition)) => condition.is_met(),
        }
    }

    /// How many more levels this requirement allows
    pub fn max_affordable(&self, owned: Decimal) -> Decimal {
        match self {
            Requirement::Cost(cost) => cost.max_affordable(owned),
            Requirement::Boolean(BooleanRequirement(condition)) => {
                if condition.is_met() {
                    Decimal::INFINITY
                } else {
                    Decimal::ZERO
                }
            }
        }
    }

    /// Deduct whatever this requirement charges
    pub fn pay(&self, owned: Decimal, amount: Decimal) {
        if let Requirement::Cost(cost) = self {
            cost.pay(owned, amount);
        }
    }
}

impl From<CostRequirement> for Requirement {
    fn from(requirement: CostRequirement) -> Self {
        Requirement::Cost(requirement)
    }
}

impl From<BooleanRequirement> for Requirement {
    fn from(requirement: BooleanRequirement) -> Self {
        Requirement::Boolean(requirement)
    }
}

/// Whether every requirement allows the next level
pub fn requirements_met(requirements: &[Requirement], owned: Decimal) -> bool {
    requirements.iter().all(|r| r.is_satisfied(owned))
}

/// The smallest allowance across all requirements
///
/// An empty list allows unlimited levels.
pub fn max_requirements_met(requirements: &[Requirement], owned: Decimal) -> Decimal {
    requirements
        .iter()
        .map(|r| r.max_affordable(owned))
        .fold(Decimal::INFINITY, |lowest, allowed| lowest.min(allowed))
}

/// Charge every requirement for `amount` levels
pub fn pay_requirements(requirements: &[Requirement], owned: Decimal, amount: Decimal) {
    for requirement in requirements {
        requirement.pay(owned, amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Flag;

    fn exponential_cost() -> Cost {
        // 10 * 2^owned
        Cost::scaling(|amount| amount.pow_base(2).mul(10))
    }

    #[test]
    fn test_fixed_cost() {
        let points = Resource::new("points", 25);
        let requirement = Requirement::cost(&points, 10);
        assert!(requirement.is_satisfied(Decimal::ZERO));
        assert_eq!(requirement.max_affordable(Decimal::ZERO), Decimal::INFINITY);

        requirement.pay(Decimal::ZERO, Decimal::ONE);
        assert_eq!(points.value(), Decimal::from(15));

        let bulk = CostRequirement::new(&points, 10).cumulative();
        assert_eq!(bulk.max_affordable(Decimal::ZERO), Decimal::ONE);
    }

    #[test]
    fn test_scaling_single() {
        let points = Resource::new("points", 100);
        let requirement = CostRequirement::new(&points, exponential_cost());
        // levels 0..=3 cost 10, 20, 40, 80; the highest affordable is level 3
        assert_eq!(requirement.max_affordable(Decimal::ZERO), Decimal::from(4));
        assert_eq!(requirement.max_affordable(Decimal::from(2)), Decimal::from(2));
        assert_eq!(requirement.max_affordable(Decimal::from(4)), Decimal::ZERO);

        // exact hit on a level price
        points.set(80);
        assert_eq!(requirement.max_affordable(Decimal::ZERO), Decimal::from(4));
    }

    #[test]
    fn test_scaling_single_pays_highest_level() {
        let points = Resource::new("points", 100);
        let requirement = CostRequirement::new(&points, exponential_cost());
        requirement.pay(Decimal::ZERO, Decimal::from(4));
        assert_eq!(points.value(), Decimal::from(20));
    }

    #[test]
    fn test_cumulative_scaling() {
        let points = Resource::new("points", 100);
        let requirement = CostRequirement::new(&points, exponential_cost()).cumulative();
        // 10 + 20 + 40 = 70 fits, adding 80 does not
        assert_eq!(requirement.max_affordable(Decimal::ZERO), Decimal::from(3));

        requirement.pay(Decimal::ZERO, Decimal::from(3));
        assert_eq!(points.value(), Decimal::from(30));
    }

    #[test]
    fn test_cumulative_beyond_direct_sum_limit() {
        // linear cost: level n costs n + 1, so k levels from zero cost k(k+1)/2
        let points = Resource::new("points", 5050);
        let requirement = CostRequirement::new(
            &points,
            Cost::scaling(|amount| amount.add(1)),
        )
        .cumulative()
        .configured(&short_sums());
        assert_eq!(requirement.max_affordable(Decimal::ZERO), Decimal::from(100));
    }

    fn short_sums() -> EngineConfig {
        EngineConfig {
            direct_sum_limit: 10,
            ..Default::default()
        }
    }

    fn growth_sum(levels: i32) -> f64 {
        (0..levels).map(|level| 1.1f64.powi(level)).sum()
    }

    #[test]
    fn test_cumulative_exponential_many_levels() {
        let available = growth_sum(200) * (1.0 + 1e-9);
        for config in [EngineConfig::default(), short_sums()] {
            let points = Resource::new("points", available);
            let requirement = CostRequirement::new(
                &points,
                Cost::scaling(|amount| amount.pow_base(1.1)),
            )
            .cumulative()
            .configured(&config);
            assert_eq!(requirement.max_affordable(Decimal::ZERO), Decimal::from(200));

            requirement.pay(Decimal::ZERO, Decimal::from(100));
            assert!(points.value().approx_eq(available - growth_sum(100), 1e-9));
        }
    }

    #[test]
    fn test_cumulative_estimate_stays_close_for_convex_costs() {
        let points = Resource::new("points", 0);
        let requirement = CostRequirement::new(
            &points,
            Cost::scaling(|amount| amount.pow(2)),
        )
        .cumulative()
        .configured(&short_sums());
        // sum of k^2 for k in 0..100
        let exact = Decimal::from(328350);
        let estimate = requirement.cost_sum(Decimal::ZERO, Decimal::from(100));
        assert!(estimate.approx_eq(exact, 1e-2));
        assert!(estimate <= exact);
    }

    #[test]
    fn test_non_invertible_cost_uses_search() {
        let points = Resource::new("points", 50);
        // floor() blocks the closed-form inverse
        let requirement = CostRequirement::new(
            &points,
            Cost::scaling(|amount| amount.mul(10).add(5).floor()),
        );
        assert!(matches!(requirement.cost(), Cost::Scaling(f) if !f.is_invertible()));
        // levels 0..=4 cost 5, 15, 25, 35, 45
        assert_eq!(requirement.max_affordable(Decimal::ZERO), Decimal::from(5));
    }

    #[test]
    fn test_without_pay() {
        let points = Resource::new("points", 100);
        let requirement = CostRequirement::new(&points, 60).without_pay();
        requirement.pay(Decimal::ZERO, Decimal::ONE);
        assert_eq!(points.value(), Decimal::from(100));
    }

    #[test]
    fn test_boolean_requirement() {
        let unlocked = Flag::new(false);
        let requirement = Requirement::condition(&unlocked);
        assert!(!requirement.is_satisfied(Decimal::ZERO));
        assert_eq!(requirement.max_affordable(Decimal::ZERO), Decimal::ZERO);

        unlocked.set(true);
        assert_eq!(requirement.max_affordable(Decimal::ZERO), Decimal::INFINITY);
    }

    #[test]
    fn test_requirement_lists() {
        let points = Resource::new("points", 100);
        let unlocked = Flag::new(true);
        let requirements = vec![
            Requirement::Cost(CostRequirement::new(&points, exponential_cost()).cumulative()),
            Requirement::condition(&unlocked),
        ];
        assert!(requirements_met(&requirements, Decimal::ZERO));
        assert_eq!(
            max_requirements_met(&requirements, Decimal::ZERO),
            Decimal::from(3)
        );
        assert_eq!(max_requirements_met(&[], Decimal::ZERO), Decimal::INFINITY);

        pay_requirements(&requirements, Decimal::ZERO, Decimal::ONE);
        assert_eq!(points.value(), Decimal::from(90));

        unlocked.set(false);
        assert!(!requirements_met(&requirements, Decimal::ONE));
    }
}
