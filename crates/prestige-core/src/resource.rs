//! Resources and other resettable state containers
//!
//! A [`Resource`] is a named decimal cell shared by handle. The owning layer
//! keeps the [`Resource`]; everyone else gets a [`ResourceRef`], which can only
//! read. Resets restore the declared default; nothing is ever destroyed.

use crate::Decimal;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Anything a reset restores to its declared default
pub trait Resettable {
    /// Restore the declared default
    fn reset(&self);

    /// Whether the current state equals the declared default
    fn is_default(&self) -> bool;

    /// Name used in logs and reset reports
    fn label(&self) -> String;
}

struct ResourceState {
    name: String,
    value: Cell<Decimal>,
    default: Decimal,
    persisted: bool,
}

/// A named, mutable decimal cell
#[derive(Clone)]
pub struct Resource(Rc<ResourceState>);

impl Resource {
    /// Create a persisted resource starting at `default`
    pub fn new(name: impl Into<String>, default: impl Into<Decimal>) -> Self {
        Self::build(name.into(), default.into(), true)
    }

    /// Create a resource the persistence layer should skip
    pub fn transient(name: impl Into<String>, default: impl Into<Decimal>) -> Self {
        Self::build(name.into(), default.into(), false)
    }

    fn build(name: String, default: Decimal, persisted: bool) -> Self {
        Self(Rc::new(ResourceState {
            name,
            value: Cell::new(default),
            default,
            persisted,
        }))
    }

    /// Current value
    pub fn value(&self) -> Decimal {
        self.0.value.get()
    }

    /// Overwrite the value
    pub fn set(&self, value: impl Into<Decimal>) {
        self.0.value.set(value.into());
    }

    /// Add to the value
    pub fn add(&self, amount: impl Into<Decimal>) {
        self.set(self.value() + amount.into());
    }

    /// Subtract from the value
    pub fn sub(&self, amount: impl Into<Decimal>) {
        self.set(self.value() - amount.into());
    }

    /// Restore the declared default
    pub fn reset(&self) {
        self.set(self.0.default);
    }

    /// The declared default
    pub fn default_value(&self) -> Decimal {
        self.0.default
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Whether external persistence should save this value
    pub fn is_persisted(&self) -> bool {
        self.0.persisted
    }

    /// A read-only view for other layers and observers
    pub fn read_only(&self) -> ResourceRef {
        ResourceRef(Rc::clone(&self.0))
    }

    /// Whether two handles point at the same cell
    pub fn ptr_eq(&self, other: &Resource) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Resettable for Resource {
    fn reset(&self) {
        Resource::reset(self);
    }

    fn is_default(&self) -> bool {
        self.value() == self.0.default
    }

    fn label(&self) -> String {
        self.0.name.clone()
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("name", &self.0.name)
            .field("value", &self.value())
            .field("default", &self.0.default)
            .finish()
    }
}

/// A read-only view of a resource
#[derive(Clone)]
pub struct ResourceRef(Rc<ResourceState>);

impl ResourceRef {
    /// Current value
    pub fn value(&self) -> Decimal {
        self.0.value.get()
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.0.name
    }
}

impl From<&Resource> for ResourceRef {
    fn from(resource: &Resource) -> Self {
        resource.read_only()
    }
}

impl fmt::Debug for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceRef({} = {})", self.0.name, self.value())
    }
}

struct FlagState {
    name: String,
    value: Cell<bool>,
    default: bool,
}

/// A named, persisted boolean (bought, active, revealed)
#[derive(Clone)]
pub struct Flag(Rc<FlagState>);

impl Flag {
    /// Create an unnamed flag
    pub fn new(default: bool) -> Self {
        Self::named("flag", default)
    }

    /// Create a flag with a name for reports and snapshots
    pub fn named(name: impl Into<String>, default: bool) -> Self {
        Self(Rc::new(FlagState {
            name: name.into(),
            value: Cell::new(default),
            default,
        }))
    }

    /// Current state
    pub fn get(&self) -> bool {
        self.0.value.get()
    }

    /// Overwrite the state
    pub fn set(&self, value: bool) {
        self.0.value.set(value);
    }

    /// Name of the flag
    pub fn name(&self) -> &str {
        &self.0.name
    }
}

impl Resettable for Flag {
    fn reset(&self) {
        self.set(self.0.default);
    }

    fn is_default(&self) -> bool {
        self.get() == self.0.default
    }

    fn label(&self) -> String {
        self.0.name.clone()
    }
}

impl fmt::Debug for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Flag({} = {})", self.0.name, self.get())
    }
}

/// Best and total values seen for a resource
#[derive(Debug, Clone)]
pub struct Tracker {
    /// Highest value observed
    pub best: Resource,
    /// Sum of everything gained
    pub total: Resource,
}

impl Tracker {
    /// Start tracking a resource, seeded from its default
    pub fn new(resource: &Resource) -> Self {
        Self {
            best: Resource::new(format!("{} best", resource.name()), resource.default_value()),
            total: Resource::new(
                format!("{} total", resource.name()),
                resource.default_value(),
            ),
        }
    }

    /// Record a gain that has already been added to `resource`
    pub fn record(&self, resource: &Resource, gained: impl Into<Decimal>) {
        let gained = gained.into();
        if gained.is_positive() {
            self.total.add(gained);
        }
        self.observe(resource);
    }

    /// Raise `best` to the resource's current value if higher
    pub fn observe(&self, resource: &Resource) {
        let current = resource.value();
        if current > self.best.value() {
            self.best.set(current);
        }
    }

    /// Overwrite both trackers, as a reseed after a reset does
    pub fn reseed(&self, value: impl Into<Decimal>) {
        let value = value.into();
        self.best.set(value);
        self.total.set(value);
    }
}

impl Resettable for Tracker {
    fn reset(&self) {
        self.best.reset();
        self.total.reset();
    }

    fn is_default(&self) -> bool {
        Resettable::is_default(&self.best) && Resettable::is_default(&self.total)
    }

    fn label(&self) -> String {
        format!("{} / {}", self.best.name(), self.total.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_reset_to_default() {
        let points = Resource::new("points", 10);
        points.add(5);
        assert_eq!(points.value(), Decimal::from(15));
        assert!(!Resettable::is_default(&points));

        points.reset();
        assert_eq!(points.value(), Decimal::from(10));
        assert!(Resettable::is_default(&points));
    }

    #[test]
    fn test_read_only_view_tracks_writes() {
        let cycles = Resource::new("cycles", 0);
        let view = cycles.read_only();
        cycles.set(3);
        assert_eq!(view.value(), Decimal::from(3));
        assert_eq!(view.name(), "cycles");
    }

    #[test]
    fn test_transient_resource() {
        let derived = Resource::transient("fractured cycles", 0);
        assert!(!derived.is_persisted());
        assert!(Resource::new("points", 0).is_persisted());
    }

    #[test]
    fn test_flag_reset() {
        let bought = Flag::named("upg11", false);
        bought.set(true);
        Resettable::reset(&bought);
        assert!(!bought.get());
        assert_eq!(bought.label(), "upg11");
    }

    #[test]
    fn test_tracker() {
        let points = Resource::new("points", 0);
        let tracker = Tracker::new(&points);

        points.add(5);
        tracker.record(&points, 5);
        points.sub(3);
        tracker.record(&points, 0);
        assert_eq!(tracker.best.value(), Decimal::from(5));
        assert_eq!(tracker.total.value(), Decimal::from(5));

        tracker.reseed(10);
        assert_eq!(tracker.best.value(), Decimal::from(10));
        Resettable::reset(&tracker);
        assert!(tracker.is_default());
    }
}
