//! Upgrades, repeatables and challenges
//!
//! All three share the same shape: persisted state in [`Flag`]s and
//! [`Resource`]s, a list of [`Requirement`]s, a sticky [`Visibility`], and
//! optional hooks run after a state change.

use crate::requirement::{max_requirements_met, pay_requirements, requirements_met};
use crate::{Condition, Decimal, Flag, Requirement, Resettable, Resource, Source};
use std::fmt;
use std::rc::Rc;

/// Callback run after a purchase or challenge transition
pub type Hook = Rc<dyn Fn()>;

/// Something a player can buy
pub trait Purchasable {
    /// Whether [`purchase`](Self::purchase) would buy anything
    fn can_purchase(&self) -> bool;

    /// Buy as much as allowed, returning how many levels were bought
    fn purchase(&self) -> Decimal;
}

/// Visibility that latches once revealed
///
/// Layer resets never hide a revealed feature again; only a hard reset
/// clears the latch.
#[derive(Debug, Clone)]
pub struct Visibility {
    condition: Condition,
    revealed: Flag,
}

impl Visibility {
    pub fn new(name: impl Into<String>, condition: impl Into<Condition>) -> Self {
        Self {
            condition: condition.into(),
            revealed: Flag::named(name, false),
        }
    }

    /// Visible from the start
    pub fn always() -> Self {
        Self::new("always", true)
    }

    /// Check visibility, latching on first satisfaction
    pub fn is_visible(&self) -> bool {
        if self.revealed.get() {
            return true;
        }
        if self.condition.is_met() {
            self.revealed.set(true);
            return true;
        }
        false
    }

    /// Latch without checking the condition
    pub fn reveal(&self) {
        self.revealed.set(true);
    }

    /// Whether the latch is set
    pub fn is_revealed(&self) -> bool {
        self.revealed.get()
    }

    /// Drop the latch (hard reset only)
    pub fn clear(&self) {
        Resettable::reset(&self.revealed);
    }

    pub fn revealed_flag(&self) -> &Flag {
        &self.revealed
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Self::always()
    }
}

fn run(hook: &Option<Hook>) {
    if let Some(hook) = hook {
        hook();
    }
}

/// A one-time purchase
#[derive(Clone)]
pub struct Upgrade {
    id: String,
    bought: Flag,
    requirements: Vec<Requirement>,
    visibility: Visibility,
    on_purchase: Option<Hook>,
}

impl Upgrade {
    pub fn new(id: impl Into<String>, requirements: Vec<Requirement>) -> Self {
        let id = id.into();
        Self {
            bought: Flag::named(id.clone(), false),
            visibility: Visibility::always(),
            id,
            requirements,
            on_purchase: None,
        }
    }

    /// Hide until `condition` first holds
    pub fn visible_when(mut self, condition: impl Into<Condition>) -> Self {
        self.visibility = Visibility::new(format!("{} revealed", self.id), condition);
        self
    }

    pub fn on_purchase(mut self, hook: impl Fn() + 'static) -> Self {
        self.on_purchase = Some(Rc::new(hook));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_bought(&self) -> bool {
        self.bought.get()
    }

    /// The persisted bought flag, for conditions and snapshots
    pub fn bought(&self) -> &Flag {
        &self.bought
    }

    pub fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }
}

impl Purchasable for Upgrade {
    fn can_purchase(&self) -> bool {
        !self.is_bought()
            && self.visibility.is_visible()
            && requirements_met(&self.requirements, Decimal::ZERO)
    }

    fn purchase(&self) -> Decimal {
        if !self.can_purchase() {
            return Decimal::ZERO;
        }
        pay_requirements(&self.requirements, Decimal::ZERO, Decimal::ONE);
        self.bought.set(true);
        self.visibility.reveal();
        tracing::debug!(upgrade = %self.id, "upgrade purchased");
        run(&self.on_purchase);
        Decimal::ONE
    }
}

impl Resettable for Upgrade {
    fn reset(&self) {
        Resettable::reset(&self.bought);
    }

    fn is_default(&self) -> bool {
        self.bought.is_default()
    }

    fn label(&self) -> String {
        self.id.clone()
    }
}

impl fmt::Debug for Upgrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upgrade")
            .field("id", &self.id)
            .field("bought", &self.is_bought())
            .finish()
    }
}

/// A purchase that can be bought many times
#[derive(Clone)]
pub struct Repeatable {
    id: String,
    amount: Resource,
    requirements: Vec<Requirement>,
    limit: Source,
    max_bulk: Source,
    visibility: Visibility,
    on_click: Option<Rc<dyn Fn(Decimal)>>,
}

impl Repeatable {
    /// Unlimited, one level per click
    pub fn new(id: impl Into<String>, requirements: Vec<Requirement>) -> Self {
        let id = id.into();
        Self {
            amount: Resource::new(format!("{} amount", id), 0),
            visibility: Visibility::always(),
            id,
            requirements,
            limit: Source::Constant(Decimal::INFINITY),
            max_bulk: Source::Constant(Decimal::ONE),
            on_click: None,
        }
    }

    /// Cap the total amount
    pub fn with_limit(mut self, limit: impl Into<Source>) -> Self {
        self.limit = limit.into();
        self
    }

    /// Allow buying up to this many levels per click
    pub fn with_max_bulk(mut self, max_bulk: impl Into<Source>) -> Self {
        self.max_bulk = max_bulk.into();
        self
    }

    pub fn visible_when(mut self, condition: impl Into<Condition>) -> Self {
        self.visibility = Visibility::new(format!("{} revealed", self.id), condition);
        self
    }

    /// Run after each click with the number of levels bought
    pub fn on_click(mut self, hook: impl Fn(Decimal) + 'static) -> Self {
        self.on_click = Some(Rc::new(hook));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Levels owned
    pub fn owned(&self) -> Decimal {
        self.amount.value()
    }

    /// The persisted amount
    pub fn amount(&self) -> &Resource {
        &self.amount
    }

    pub fn limit(&self) -> Decimal {
        self.limit.get()
    }

    pub fn is_maxed(&self) -> bool {
        self.owned() >= self.limit()
    }

    pub fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    /// Price of the next level under the first cost requirement
    pub fn cost(&self) -> Option<Decimal> {
        self.requirements.iter().find_map(|requirement| match requirement {
            Requirement::Cost(cost) => Some(cost.cost().at(self.owned())),
            Requirement::Boolean(_) => None,
        })
    }

    /// Levels the next click would buy
    pub fn purchasable_count(&self) -> Decimal {
        let owned = self.owned();
        max_requirements_met(&self.requirements, owned)
            .min(self.limit() - owned)
            .min(self.max_bulk.get())
            .floor()
            .max(0)
    }
}

impl Purchasable for Repeatable {
    fn can_purchase(&self) -> bool {
        !self.is_maxed()
            && self.visibility.is_visible()
            && requirements_met(&self.requirements, self.owned())
    }

    fn purchase(&self) -> Decimal {
        if !self.can_purchase() {
            return Decimal::ZERO;
        }
        let count = self.purchasable_count();
        if !count.is_positive() {
            return Decimal::ZERO;
        }
        pay_requirements(&self.requirements, self.owned(), count);
        self.amount.add(count);
        self.visibility.reveal();
        tracing::debug!(repeatable = %self.id, bought = %count, owned = %self.owned(), "repeatable purchased");
        if let Some(hook) = &self.on_click {
            hook(count);
        }
        count
    }
}

impl Resettable for Repeatable {
    fn reset(&self) {
        self.amount.reset();
    }

    fn is_default(&self) -> bool {
        Resettable::is_default(&self.amount)
    }

    fn label(&self) -> String {
        self.id.clone()
    }
}

impl fmt::Debug for Repeatable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repeatable")
            .field("id", &self.id)
            .field("owned", &self.owned())
            .finish()
    }
}

/// An opt-in run with a goal
///
/// The requirements are the goal; they are checked against the current
/// completion count when the challenge is completed or exited.
#[derive(Clone)]
pub struct Challenge {
    id: String,
    active: Flag,
    completions: Resource,
    completion_limit: Decimal,
    requirements: Vec<Requirement>,
    can_start: Condition,
    visibility: Visibility,
    on_enter: Option<Hook>,
    on_exit: Option<Hook>,
    on_complete: Option<Hook>,
}

impl Challenge {
    pub fn new(id: impl Into<String>, requirements: Vec<Requirement>) -> Self {
        let id = id.into();
        Self {
            active: Flag::named(format!("{} active", id), false),
            completions: Resource::new(format!("{} completions", id), 0),
            completion_limit: Decimal::ONE,
            visibility: Visibility::always(),
            can_start: Condition::always(),
            id,
            requirements,
            on_enter: None,
            on_exit: None,
            on_complete: None,
        }
    }

    pub fn with_completion_limit(mut self, limit: impl Into<Decimal>) -> Self {
        self.completion_limit = limit.into();
        self
    }

    /// Extra gate for entering, on top of visibility
    pub fn startable_when(mut self, condition: impl Into<Condition>) -> Self {
        self.can_start = condition.into();
        self
    }

    pub fn visible_when(mut self, condition: impl Into<Condition>) -> Self {
        self.visibility = Visibility::new(format!("{} revealed", self.id), condition);
        self
    }

    pub fn on_enter(mut self, hook: impl Fn() + 'static) -> Self {
        self.on_enter = Some(Rc::new(hook));
        self
    }

    pub fn on_exit(mut self, hook: impl Fn() + 'static) -> Self {
        self.on_exit = Some(Rc::new(hook));
        self
    }

    pub fn on_complete(mut self, hook: impl Fn() + 'static) -> Self {
        self.on_complete = Some(Rc::new(hook));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    pub fn active(&self) -> &Flag {
        &self.active
    }

    pub fn completion_count(&self) -> Decimal {
        self.completions.value()
    }

    pub fn completions(&self) -> &Resource {
        &self.completions
    }

    pub fn is_maxed(&self) -> bool {
        self.completion_count() >= self.completion_limit
    }

    pub fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    pub fn can_start(&self) -> bool {
        !self.is_active()
            && !self.is_maxed()
            && self.visibility.is_visible()
            && self.can_start.is_met()
    }

    /// Whether the goal is met while active
    pub fn can_complete(&self) -> bool {
        self.is_active()
            && !self.is_maxed()
            && requirements_met(&self.requirements, self.completion_count())
    }

    /// Start the challenge; `false` if it cannot start
    pub fn enter(&self) -> bool {
        if !self.can_start() {
            return false;
        }
        self.active.set(true);
        tracing::debug!(challenge = %self.id, "challenge entered");
        run(&self.on_enter);
        true
    }

    /// Leave the challenge, recording a completion if the goal is met
    ///
    /// Returns whether a completion was recorded.
    pub fn exit(&self) -> bool {
        if !self.is_active() {
            return false;
        }
        let completed = self.can_complete();
        if completed {
            pay_requirements(&self.requirements, self.completion_count(), Decimal::ONE);
            self.completions.add(1);
            tracing::debug!(
                challenge = %self.id,
                completions = %self.completion_count(),
                "challenge completed"
            );
            run(&self.on_complete);
        }
        self.active.set(false);
        run(&self.on_exit);
        completed
    }

    /// Complete and leave; does nothing unless the goal is met
    pub fn complete(&self) -> bool {
        if !self.can_complete() {
            return false;
        }
        self.exit()
    }

    /// Enter when inactive, exit when active
    pub fn toggle(&self) {
        if self.is_active() {
            self.exit();
        } else {
            self.enter();
        }
    }
}

impl Resettable for Challenge {
    fn reset(&self) {
        Resettable::reset(&self.active);
        self.completions.reset();
    }

    fn is_default(&self) -> bool {
        self.active.is_default() && Resettable::is_default(&self.completions)
    }

    fn label(&self) -> String {
        self.id.clone()
    }
}

impl fmt::Debug for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Challenge")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .field("completions", &self.completion_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirement::{Cost, CostRequirement};
    use std::cell::Cell;

    #[test]
    fn test_visibility_is_sticky() {
        let amount = Resource::new("amount", 0);
        let reader = amount.read_only();
        let visibility = Visibility::new("upg21", Condition::from_fn(move || {
            reader.value() >= Decimal::from(3)
        }));
        assert!(!visibility.is_visible());

        amount.set(3);
        assert!(visibility.is_visible());

        amount.reset();
        assert!(visibility.is_visible());

        visibility.clear();
        assert!(!visibility.is_visible());
    }

    #[test]
    fn test_upgrade_purchase() {
        let points = Resource::new("points", 15);
        let purchases = Rc::new(Cell::new(0));
        let counter = Rc::clone(&purchases);
        let upgrade = Upgrade::new("upg11", vec![Requirement::cost(&points, 10)])
            .on_purchase(move || counter.set(counter.get() + 1));

        assert!(upgrade.can_purchase());
        assert_eq!(upgrade.purchase(), Decimal::ONE);
        assert!(upgrade.is_bought());
        assert_eq!(points.value(), Decimal::from(5));
        assert_eq!(purchases.get(), 1);

        // bought upgrades cannot be bought again
        points.set(100);
        assert!(!upgrade.can_purchase());
        assert_eq!(upgrade.purchase(), Decimal::ZERO);
        assert_eq!(points.value(), Decimal::from(100));

        Resettable::reset(&upgrade);
        assert!(!upgrade.is_bought());
    }

    #[test]
    fn test_hidden_upgrade_cannot_be_bought() {
        let points = Resource::new("points", 100);
        let upgrade =
            Upgrade::new("upg21", vec![Requirement::cost(&points, 10)]).visible_when(false);
        assert!(!upgrade.can_purchase());
        assert_eq!(upgrade.purchase(), Decimal::ZERO);
    }

    #[test]
    fn test_repeatable_limit() {
        let points = Resource::new("points", 1000);
        let shard = Repeatable::new("buy12", vec![Requirement::cost(&points, 10)]).with_limit(5);

        for _ in 0..5 {
            assert_eq!(shard.purchase(), Decimal::ONE);
        }
        assert!(shard.is_maxed());
        assert!(!shard.can_purchase());
        assert_eq!(shard.purchase(), Decimal::ZERO);
        assert_eq!(shard.owned(), Decimal::from(5));
        assert_eq!(points.value(), Decimal::from(950));
    }

    #[test]
    fn test_repeatable_bulk() {
        let points = Resource::new("points", 100);
        let requirement = CostRequirement::new(
            &points,
            Cost::scaling(|amount| amount.pow_base(2).mul(10)),
        )
        .cumulative();
        let clicks = Rc::new(Cell::new(Decimal::ZERO));
        let seen = Rc::clone(&clicks);
        let fractured = Repeatable::new("buy11", vec![requirement.into()])
            .with_max_bulk(10)
            .on_click(move |count| seen.set(count));

        assert_eq!(fractured.cost(), Some(Decimal::from(10)));
        assert_eq!(fractured.purchasable_count(), Decimal::from(3));
        assert_eq!(fractured.purchase(), Decimal::from(3));
        assert_eq!(clicks.get(), Decimal::from(3));
        assert_eq!(points.value(), Decimal::from(30));
        assert_eq!(fractured.cost(), Some(Decimal::from(80)));
        assert!(!fractured.can_purchase());
    }

    #[test]
    fn test_repeatable_bulk_respects_limit() {
        let points = Resource::new("points", 1000);
        let repeatable = Repeatable::new("buy13", vec![Requirement::cost(&points, 1)])
            .with_max_bulk(50)
            .with_limit(4);
        assert_eq!(repeatable.purchase(), Decimal::from(4));
        assert!(repeatable.is_maxed());
    }

    #[test]
    fn test_challenge_flow() {
        let points = Resource::new("points", 0);
        let events = Rc::new(Cell::new((0, 0, 0)));
        let (on_enter, on_exit, on_complete) =
            (Rc::clone(&events), Rc::clone(&events), Rc::clone(&events));

        let challenge = Challenge::new(
            "chal11",
            vec![Requirement::Cost(CostRequirement::new(&points, 1e6).without_pay())],
        )
        .on_enter(move || {
            let (a, b, c) = on_enter.get();
            on_enter.set((a + 1, b, c));
        })
        .on_exit(move || {
            let (a, b, c) = on_exit.get();
            on_exit.set((a, b + 1, c));
        })
        .on_complete(move || {
            let (a, b, c) = on_complete.get();
            on_complete.set((a, b, c + 1));
        });

        assert!(challenge.enter());
        assert!(challenge.is_active());
        assert!(!challenge.enter());

        // leaving early records nothing
        assert!(!challenge.complete());
        assert!(!challenge.exit());
        assert!(!challenge.is_active());
        assert_eq!(challenge.completion_count(), Decimal::ZERO);
        assert_eq!(events.get(), (1, 1, 0));

        challenge.toggle();
        points.set(1e6);
        assert!(challenge.complete());
        assert!(!challenge.is_active());
        assert_eq!(challenge.completion_count(), Decimal::ONE);
        assert_eq!(events.get(), (2, 2, 1));
        assert_eq!(points.value(), Decimal::from(1e6));

        // completion limit of one
        assert!(challenge.is_maxed());
        assert!(!challenge.enter());

        Resettable::reset(&challenge);
        assert_eq!(challenge.completion_count(), Decimal::ZERO);
        assert!(challenge.can_start());
    }

    #[test]
    fn test_challenge_start_gate() {
        let unlocked = Flag::new(false);
        let challenge = Challenge::new("chal12", vec![]).startable_when(&unlocked);
        assert!(!challenge.enter());
        unlocked.set(true);
        assert!(challenge.enter());
        // empty goal is met immediately
        assert!(challenge.complete());
    }
}
