//! Cumulative conversions from one resource into another

use crate::{Condition, Decimal, Formula, Resource, ResourceRef, Tracker};

/// Turns a base resource into a gain resource without consuming the base
///
/// The base is read through the formula's variable. Gains are recomputed on
/// every read, so a conversion never holds stale values.
#[derive(Debug, Clone)]
pub struct Conversion {
    base: ResourceRef,
    gain: Resource,
    formula: Formula,
    floor_gain: bool,
    tracker: Option<Tracker>,
    alternate: Option<Alternate>,
}

/// A second base and formula that take over while a condition holds
#[derive(Debug, Clone)]
struct Alternate {
    when: Condition,
    base: ResourceRef,
    formula: Formula,
}

impl Conversion {
    /// Create a conversion; `formula` receives a formula over the base resource
    pub fn new(
        base: impl Into<ResourceRef>,
        gain: &Resource,
        formula: impl FnOnce(Formula) -> Formula,
    ) -> Self {
        let base = base.into();
        let formula = formula(Formula::variable(base.clone()));
        Self {
            base,
            gain: gain.clone(),
            formula,
            floor_gain: false,
            tracker: None,
            alternate: None,
        }
    }

    /// Convert from `base` through `formula` instead while `when` holds
    pub fn alternate(
        mut self,
        when: impl Into<Condition>,
        base: impl Into<ResourceRef>,
        formula: impl FnOnce(Formula) -> Formula,
    ) -> Self {
        let base = base.into();
        let formula = formula(Formula::variable(base.clone()));
        self.alternate = Some(Alternate {
            when: when.into(),
            base,
            formula,
        });
        self
    }

    fn current(&self) -> (&ResourceRef, &Formula) {
        match &self.alternate {
            Some(alternate) if alternate.when.is_met() => (&alternate.base, &alternate.formula),
            _ => (&self.base, &self.formula),
        }
    }

    /// Round gains down to whole units
    pub fn floored(mut self) -> Self {
        self.floor_gain = true;
        self
    }

    /// Record every trigger in a best/total tracker for the gain resource
    pub fn tracked(mut self, tracker: Tracker) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// What [`trigger`](Self::trigger) would add right now
    pub fn current_gain(&self) -> Decimal {
        let gain = self.formula().evaluate();
        if self.floor_gain {
            gain.floor()
        } else {
            gain
        }
    }

    /// Whether triggering now would gain anything
    pub fn can_convert(&self) -> bool {
        self.current_gain().is_positive()
    }

    /// Base amount needed for the next whole unit of gain
    pub fn next_at(&self) -> Option<Decimal> {
        self.formula().invert(self.current_gain().floor() + 1)
    }

    /// Add the current gain to the gain resource, leaving the base untouched
    pub fn trigger(&self) -> Decimal {
        let gained = self.current_gain();
        self.gain.add(gained);
        if let Some(tracker) = &self.tracker {
            tracker.record(&self.gain, gained);
        }
        tracing::debug!(
            base = self.base().name(),
            gain = self.gain.name(),
            gained = %gained,
            "conversion triggered"
        );
        gained
    }

    /// The base currently converted from
    pub fn base(&self) -> &ResourceRef {
        self.current().0
    }

    pub fn gain(&self) -> &Resource {
        &self.gain
    }

    pub fn formula(&self) -> &Formula {
        self.current().1
    }

    pub fn tracker(&self) -> Option<&Tracker> {
        self.tracker.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Flag;
    use proptest::prelude::*;

    #[test]
    fn test_hundred_points_give_ten() {
        let points = Resource::new("points", 100);
        let cycles = Resource::new("cycles", 0);
        let conversion = Conversion::new(&points, &cycles, |x| x.div(10));

        assert_eq!(conversion.current_gain(), Decimal::from(10));
        assert_eq!(conversion.trigger(), Decimal::from(10));
        assert_eq!(cycles.value(), Decimal::from(10));
        assert_eq!(points.value(), Decimal::from(100));

        conversion.trigger();
        assert_eq!(cycles.value(), Decimal::from(20));
        assert_eq!(points.value(), Decimal::from(100));
    }

    #[test]
    fn test_gain_is_recomputed_on_read() {
        let points = Resource::new("points", 0);
        let cycles = Resource::new("cycles", 0);
        let conversion = Conversion::new(&points, &cycles, |x| x.div(10).sqrt()).floored();
        assert!(!conversion.can_convert());

        points.set(250);
        assert_eq!(conversion.current_gain(), Decimal::from(5));
        assert!(conversion.can_convert());
        assert!(conversion.next_at().unwrap().approx_eq(360, 1e-12));
    }

    #[test]
    fn test_tracker_records_triggers() {
        let points = Resource::new("points", 40);
        let cycles = Resource::new("cycles", 0);
        let tracker = Tracker::new(&cycles);
        let conversion =
            Conversion::new(&points, &cycles, |x| x.div(10)).tracked(tracker.clone());

        conversion.trigger();
        conversion.trigger();
        assert_eq!(tracker.total.value(), Decimal::from(8));
        assert_eq!(tracker.best.value(), Decimal::from(8));
    }

    #[test]
    fn test_alternate_base_while_condition_holds() {
        let cycles = Resource::new("cycles", 5e6);
        let hypercycles = Resource::new("hypercycles", 1000);
        let broken = Resource::new("broken cycles", 0);
        let trial = Flag::new(false);
        let conversion = Conversion::new(&cycles, &broken, |x| x.div(5e6))
            .alternate(&trial, &hypercycles, |x| x.div(10).sqrt());

        assert_eq!(conversion.base().name(), "cycles");
        assert_eq!(conversion.current_gain(), Decimal::ONE);

        trial.set(true);
        assert_eq!(conversion.base().name(), "hypercycles");
        assert!(conversion.current_gain().approx_eq(10, 1e-12));
        conversion.trigger();
        assert!(broken.value().approx_eq(10, 1e-12));
        assert_eq!(hypercycles.value(), Decimal::from(1000));
    }

    proptest! {
        #[test]
        fn prop_cumulative_gain_never_decreases(
            bases in proptest::collection::vec(0.0f64..1e9, 1..20),
        ) {
            let points = Resource::new("points", 0);
            let cycles = Resource::new("cycles", 0);
            let conversion = Conversion::new(&points, &cycles, |x| x.div(10).sqrt());

            for base in bases {
                points.set(base);
                let before = cycles.value();
                conversion.trigger();
                prop_assert!(cycles.value() >= before);
                prop_assert_eq!(points.value(), Decimal::from(base));
            }
        }
    }
}
