//! Pull-based value and condition sources
//!
//! Nothing here caches: a [`Source`] or [`Condition`] is read fresh every time
//! it is asked, so modifiers and formulas always reflect the latest game state.

use crate::{Decimal, Flag, Resource, ResourceRef};
use std::fmt;
use std::rc::Rc;

/// A number read at evaluation time
#[derive(Clone)]
pub enum Source {
    /// A fixed value
    Constant(Decimal),
    /// The current value of a resource
    Resource(ResourceRef),
    /// A value recomputed on every read
    Computed(Rc<dyn Fn() -> Decimal>),
}

impl Source {
    /// Create a source recomputed from a closure on every read
    pub fn computed(f: impl Fn() -> Decimal + 'static) -> Self {
        Source::Computed(Rc::new(f))
    }

    /// Read the current value
    pub fn get(&self) -> Decimal {
        match self {
            Source::Constant(value) => *value,
            Source::Resource(resource) => resource.value(),
            Source::Computed(f) => f(),
        }
    }

    /// Whether the value can never change
    pub fn is_constant(&self) -> bool {
        matches!(self, Source::Constant(_))
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Constant(value) => write!(f, "Constant({})", value),
            Source::Resource(resource) => write!(f, "Resource({})", resource.name()),
            Source::Computed(_) => write!(f, "Computed"),
        }
    }
}

impl From<Decimal> for Source {
    fn from(value: Decimal) -> Self {
        Source::Constant(value)
    }
}

impl From<f64> for Source {
    fn from(value: f64) -> Self {
        Source::Constant(value.into())
    }
}

impl From<i32> for Source {
    fn from(value: i32) -> Self {
        Source::Constant(value.into())
    }
}

impl From<ResourceRef> for Source {
    fn from(resource: ResourceRef) -> Self {
        Source::Resource(resource)
    }
}

impl From<&Resource> for Source {
    fn from(resource: &Resource) -> Self {
        Source::Resource(resource.read_only())
    }
}

impl From<Resource> for Source {
    fn from(resource: Resource) -> Self {
        Source::Resource(resource.read_only())
    }
}

/// A boolean predicate evaluated fresh on every check
#[derive(Clone)]
pub enum Condition {
    /// A fixed answer
    Constant(bool),
    /// The current state of a flag
    Flag(Flag),
    /// A predicate re-run on every check
    Computed(Rc<dyn Fn() -> bool>),
}

impl Condition {
    /// Always satisfied
    pub fn always() -> Self {
        Condition::Constant(true)
    }

    /// Never satisfied
    pub fn never() -> Self {
        Condition::Constant(false)
    }

    /// Create a condition from a predicate
    pub fn from_fn(f: impl Fn() -> bool + 'static) -> Self {
        Condition::Computed(Rc::new(f))
    }

    /// Evaluate now
    pub fn is_met(&self) -> bool {
        match self {
            Condition::Constant(value) => *value,
            Condition::Flag(flag) => flag.get(),
            Condition::Computed(f) => f(),
        }
    }

    /// Negate
    pub fn not(self) -> Self {
        match self {
            Condition::Constant(value) => Condition::Constant(!value),
            other => Condition::from_fn(move || !other.is_met()),
        }
    }

    /// Both must hold
    pub fn and(self, other: impl Into<Condition>) -> Self {
        let other = other.into();
        Condition::from_fn(move || self.is_met() && other.is_met())
    }

    /// Either may hold
    pub fn or(self, other: impl Into<Condition>) -> Self {
        let other = other.into();
        Condition::from_fn(move || self.is_met() || other.is_met())
    }
}

impl Default for Condition {
    fn default() -> Self {
        Condition::always()
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Constant(value) => write!(f, "Constant({})", value),
            Condition::Flag(flag) => write!(f, "Flag({})", flag.get()),
            Condition::Computed(_) => write!(f, "Computed"),
        }
    }
}

impl From<bool> for Condition {
    fn from(value: bool) -> Self {
        Condition::Constant(value)
    }
}

impl From<Flag> for Condition {
    fn from(flag: Flag) -> Self {
        Condition::Flag(flag)
    }
}

impl From<&Flag> for Condition {
    fn from(flag: &Flag) -> Self {
        Condition::Flag(flag.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_reads_latest_value() {
        let points = Resource::new("points", 0);
        let source = Source::from(&points);
        assert_eq!(source.get(), Decimal::ZERO);

        points.set(42);
        assert_eq!(source.get(), Decimal::from(42));
        assert!(!source.is_constant());
        assert!(Source::from(3.0).is_constant());
    }

    #[test]
    fn test_computed_source() {
        let points = Resource::new("points", 10);
        let reader = points.read_only();
        let doubled = Source::computed(move || reader.value() * 2);
        assert_eq!(doubled.get(), Decimal::from(20));
        points.set(7);
        assert_eq!(doubled.get(), Decimal::from(14));
    }

    #[test]
    fn test_condition_combinators() {
        let bought = Flag::new(false);
        let condition = Condition::from(&bought).and(true);
        assert!(!condition.is_met());

        bought.set(true);
        assert!(condition.is_met());
        assert!(!Condition::from(&bought).not().is_met());
        assert!(Condition::never().or(&bought).is_met());
        assert!(Condition::default().is_met());
    }
}
