//! Modifiers and modifier pipelines
//!
//! A [`Modifier`] is one small, toggleable transformation of a value. A
//! [`ModifierPipeline`] applies its members in declaration order and can run
//! backwards when every enabled member has an inverse.

use crate::{Condition, Decimal, Source};
use serde::{Deserialize, Serialize};

/// The operation a modifier performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifyOp {
    /// Add the operand
    Add,
    /// Multiply by the operand
    Mul,
    /// Raise to the operand
    Pow,
}

impl ModifyOp {
    /// Apply this operation to a current value
    pub fn apply(&self, current: Decimal, operand: Decimal) -> Decimal {
        match self {
            ModifyOp::Add => current + operand,
            ModifyOp::Mul => current * operand,
            ModifyOp::Pow => current.pow(operand),
        }
    }

    /// Undo this operation, `None` when the operand makes it degenerate
    pub fn invert(&self, result: Decimal, operand: Decimal) -> Option<Decimal> {
        if !operand.is_finite() {
            return None;
        }
        match self {
            ModifyOp::Add => Some(result - operand),
            ModifyOp::Mul if operand.is_zero() => None,
            ModifyOp::Mul => Some(result / operand),
            ModifyOp::Pow if operand.is_zero() => None,
            ModifyOp::Pow => Some(result.root(operand)),
        }
    }

    /// Whether the operand leaves the operation invertible
    pub fn is_invertible_with(&self, operand: Decimal) -> bool {
        operand.is_finite() && (matches!(self, ModifyOp::Add) || !operand.is_zero())
    }

    fn label(&self) -> &'static str {
        match self {
            ModifyOp::Add => "Additive",
            ModifyOp::Mul => "Multiplicative",
            ModifyOp::Pow => "Exponential",
        }
    }
}

/// What a modifier does, with its live operand
#[derive(Debug, Clone)]
pub enum ModifierKind {
    /// `x + amount`
    Additive(Source),
    /// `x * factor`
    Multiplicative(Source),
    /// `x ^ exponent`
    Exponential(Source),
}

impl ModifierKind {
    /// Build the variant for an operation
    pub fn new(op: ModifyOp, operand: impl Into<Source>) -> Self {
        let operand = operand.into();
        match op {
            ModifyOp::Add => ModifierKind::Additive(operand),
            ModifyOp::Mul => ModifierKind::Multiplicative(operand),
            ModifyOp::Pow => ModifierKind::Exponential(operand),
        }
    }

    /// The operation performed
    pub fn op(&self) -> ModifyOp {
        match self {
            ModifierKind::Additive(_) => ModifyOp::Add,
            ModifierKind::Multiplicative(_) => ModifyOp::Mul,
            ModifierKind::Exponential(_) => ModifyOp::Pow,
        }
    }

    /// The operand source
    pub fn operand(&self) -> &Source {
        match self {
            ModifierKind::Additive(source)
            | ModifierKind::Multiplicative(source)
            | ModifierKind::Exponential(source) => source,
        }
    }
}

/// A single toggleable transformation
#[derive(Debug, Clone)]
pub struct Modifier {
    kind: ModifierKind,
    enabled: Condition,
    description: Option<String>,
}

impl Modifier {
    /// Create an always-enabled modifier
    pub fn new(kind: ModifierKind) -> Self {
        Self {
            kind,
            enabled: Condition::always(),
            description: None,
        }
    }

    /// `x + amount`
    pub fn additive(amount: impl Into<Source>) -> Self {
        Self::new(ModifierKind::Additive(amount.into()))
    }

    /// `x * factor`
    pub fn multiplicative(factor: impl Into<Source>) -> Self {
        Self::new(ModifierKind::Multiplicative(factor.into()))
    }

    /// `x ^ exponent`
    pub fn exponential(exponent: impl Into<Source>) -> Self {
        Self::new(ModifierKind::Exponential(exponent.into()))
    }

    /// A modifier that only acts while `condition` holds
    pub fn conditional(
        value: impl Into<Source>,
        op: ModifyOp,
        condition: impl Into<Condition>,
    ) -> Self {
        Self::new(ModifierKind::new(op, value)).when(condition)
    }

    /// Gate this modifier behind a condition
    pub fn when(mut self, condition: impl Into<Condition>) -> Self {
        self.enabled = condition.into();
        self
    }

    /// Attach a label for breakdown displays
    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The transformation
    pub fn kind(&self) -> &ModifierKind {
        &self.kind
    }

    /// Evaluate the enable condition now
    pub fn is_enabled(&self) -> bool {
        self.enabled.is_met()
    }

    /// Apply forwards; identity while disabled
    pub fn apply(&self, value: Decimal) -> Decimal {
        if !self.is_enabled() {
            return value;
        }
        self.kind.op().apply(value, self.kind.operand().get())
    }

    /// Apply backwards; identity while disabled
    pub fn invert(&self, value: Decimal) -> Option<Decimal> {
        if !self.is_enabled() {
            return Some(value);
        }
        self.kind.op().invert(value, self.kind.operand().get())
    }

    /// Whether [`invert`](Self::invert) would currently succeed
    pub fn is_invertible(&self) -> bool {
        !self.is_enabled() || self.kind.op().is_invertible_with(self.kind.operand().get())
    }

    /// Label and operand, if enabled
    pub fn describe(&self) -> Option<(String, Decimal)> {
        if !self.is_enabled() {
            return None;
        }
        let label = self
            .description
            .clone()
            .unwrap_or_else(|| self.kind.op().label().to_string());
        Some((label, self.kind.operand().get()))
    }
}

/// An ordered list of modifiers
///
/// The engine never reorders members: `(x + 2) * 3` and `x * 3 + 2` are
/// different pipelines.
#[derive(Debug, Clone, Default)]
pub struct ModifierPipeline {
    modifiers: Vec<Modifier>,
}

impl ModifierPipeline {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a modifier
    pub fn with(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    /// Append a modifier in place
    pub fn push(&mut self, modifier: Modifier) {
        self.modifiers.push(modifier);
    }

    /// Fold left over enabled members
    pub fn apply(&self, value: impl Into<Decimal>) -> Decimal {
        self.modifiers
            .iter()
            .fold(value.into(), |acc, modifier| modifier.apply(acc))
    }

    /// Fold right with each member's inverse
    pub fn invert(&self, value: impl Into<Decimal>) -> Option<Decimal> {
        self.modifiers
            .iter()
            .rev()
            .try_fold(value.into(), |acc, modifier| modifier.invert(acc))
    }

    /// Whether every enabled member is invertible right now
    pub fn is_invertible(&self) -> bool {
        self.modifiers.iter().all(Modifier::is_invertible)
    }

    /// `(label, operand)` for every enabled member, in order
    pub fn describe(&self) -> Vec<(String, Decimal)> {
        self.modifiers.iter().filter_map(Modifier::describe).collect()
    }

    /// Whether any member is currently enabled
    pub fn enabled(&self) -> bool {
        self.modifiers.iter().any(Modifier::is_enabled)
    }

    /// The pipeline applied to one
    pub fn effect(&self) -> Decimal {
        self.apply(Decimal::ONE)
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Modifier> {
        self.modifiers.iter()
    }
}

impl FromIterator<Modifier> for ModifierPipeline {
    fn from_iter<I: IntoIterator<Item = Modifier>>(iter: I) -> Self {
        Self {
            modifiers: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Flag, Resource};
    use proptest::prelude::*;

    #[test]
    fn test_apply_in_order() {
        let pipeline = ModifierPipeline::new()
            .with(Modifier::additive(2))
            .with(Modifier::multiplicative(3));
        assert_eq!(pipeline.apply(1), Decimal::from(9));

        let reversed = ModifierPipeline::new()
            .with(Modifier::multiplicative(3))
            .with(Modifier::additive(2));
        assert_eq!(reversed.apply(1), Decimal::from(5));
    }

    #[test]
    fn test_invert_in_reverse_order() {
        let pipeline = ModifierPipeline::new()
            .with(Modifier::additive(2))
            .with(Modifier::multiplicative(3))
            .with(Modifier::exponential(2));
        let y = pipeline.apply(4);
        assert_eq!(y, Decimal::from(324));
        let x = pipeline.invert(y).unwrap();
        assert!(x.approx_eq(4, 1e-12));
    }

    #[test]
    fn test_disabled_modifier_is_identity() {
        let upgrade = Flag::new(false);
        let pipeline = ModifierPipeline::new()
            .with(Modifier::conditional(5, ModifyOp::Mul, &upgrade))
            .with(Modifier::conditional(0, ModifyOp::Mul, false));

        assert_eq!(pipeline.apply(7), Decimal::from(7));
        assert_eq!(pipeline.invert(7), Some(Decimal::from(7)));
        assert!(pipeline.is_invertible());
        assert!(pipeline.describe().is_empty());
        assert!(!pipeline.enabled());

        upgrade.set(true);
        assert_eq!(pipeline.apply(7), Decimal::from(35));
        assert!(pipeline.enabled());
    }

    #[test]
    fn test_zero_multiplier_not_invertible() {
        let pipeline = ModifierPipeline::new()
            .with(Modifier::additive(1))
            .with(Modifier::multiplicative(0));
        assert_eq!(pipeline.apply(10), Decimal::ZERO);
        assert!(!pipeline.is_invertible());
        assert_eq!(pipeline.invert(0), None);

        let zero_power = ModifierPipeline::new().with(Modifier::exponential(0));
        assert_eq!(zero_power.invert(1), None);

        let infinite = ModifierPipeline::new().with(Modifier::multiplicative(Decimal::INFINITY));
        assert_eq!(infinite.invert(1), None);
    }

    #[test]
    fn test_operands_are_pulled_fresh() {
        let cycles = Resource::new("cycles", 2);
        let pipeline = ModifierPipeline::new().with(Modifier::multiplicative(&cycles));
        assert_eq!(pipeline.effect(), Decimal::from(2));
        cycles.set(8);
        assert_eq!(pipeline.effect(), Decimal::from(8));
    }

    #[test]
    fn test_describe_labels() {
        let pipeline = ModifierPipeline::new()
            .with(Modifier::multiplicative(2).described("Cyclic Points"))
            .with(Modifier::additive(1));
        let breakdown = pipeline.describe();
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0], ("Cyclic Points".to_string(), Decimal::from(2)));
        assert_eq!(breakdown[1].0, "Additive");
    }

    proptest! {
        #[test]
        fn prop_pipeline_round_trip(
            x in 0.001f64..1e6,
            add in 0.0f64..100.0,
            mul in 0.01f64..100.0,
            pow in 0.5f64..3.0,
            enabled in proptest::collection::vec(any::<bool>(), 3),
        ) {
            let pipeline = ModifierPipeline::new()
                .with(Modifier::additive(add).when(enabled[0]))
                .with(Modifier::multiplicative(mul).when(enabled[1]))
                .with(Modifier::exponential(pow).when(enabled[2]));
            prop_assert!(pipeline.is_invertible());

            let y = pipeline.apply(x);
            let back = pipeline.invert(y).unwrap();
            prop_assert!(back.approx_eq(x, 1e-6), "x = {}, back = {}", x, back);
        }
    }
}
