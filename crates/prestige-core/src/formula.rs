//! Formula trees over a single free variable
//!
//! A formula is built by chaining operations onto a variable bound to a live
//! [`Source`] (usually a resource). It evaluates against the current value of
//! that source and, when every node on the path to the variable has an inverse,
//! solves backwards for the input that produces a given output.
//!
//! ```text
//! cost = 10 * 1.5^amount
//! Formula::variable(&amount).pow_base(1.5).mul(10)
//! ```

pub mod search;

use crate::{Decimal, Resource, Source};
use search::Bracket;
use std::rc::Rc;

/// Relative error allowed when checking a closed-form inverse
const INVERT_TOLERANCE: f64 = 1e-9;

/// Single-argument operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Abs,
    Recip,
    Sqrt,
    Ln,
    Log10,
    Sin,
    Cos,
    Floor,
    Ceil,
    Round,
}

impl UnaryOp {
    fn apply(&self, value: Decimal) -> Decimal {
        match self {
            UnaryOp::Neg => -value,
            UnaryOp::Abs => value.abs(),
            UnaryOp::Recip => value.recip(),
            UnaryOp::Sqrt => value.sqrt(),
            UnaryOp::Ln => value.ln(),
            UnaryOp::Log10 => value.log10(),
            UnaryOp::Sin => value.sin(),
            UnaryOp::Cos => value.cos(),
            UnaryOp::Floor => value.floor(),
            UnaryOp::Ceil => value.ceil(),
            UnaryOp::Round => value.round(),
        }
    }

    /// The input producing `target`, if this operation is one-to-one
    fn invert(&self, target: Decimal) -> Option<Decimal> {
        match self {
            UnaryOp::Neg => Some(-target),
            UnaryOp::Recip => Some(target.recip()),
            UnaryOp::Sqrt if target.is_negative() => None,
            UnaryOp::Sqrt => Some(target.pow(2)),
            UnaryOp::Ln => Some(target.pow_base(std::f64::consts::E)),
            UnaryOp::Log10 => Some(Decimal::pow10(target)),
            UnaryOp::Abs
            | UnaryOp::Sin
            | UnaryOp::Cos
            | UnaryOp::Floor
            | UnaryOp::Ceil
            | UnaryOp::Round => None,
        }
    }

    fn is_invertible(&self) -> bool {
        matches!(
            self,
            UnaryOp::Neg | UnaryOp::Recip | UnaryOp::Sqrt | UnaryOp::Ln | UnaryOp::Log10
        )
    }
}

/// Two-argument operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    /// `lhs ^ rhs`
    Pow,
    /// `log_rhs(lhs)`
    Log,
    /// `lhs ^ (1 / rhs)`
    Root,
    Min,
    Max,
}

impl BinaryOp {
    fn apply(&self, lhs: Decimal, rhs: Decimal) -> Decimal {
        match self {
            BinaryOp::Add => lhs + rhs,
            BinaryOp::Sub => lhs - rhs,
            BinaryOp::Mul => lhs * rhs,
            BinaryOp::Div => lhs / rhs,
            BinaryOp::Pow => lhs.pow(rhs),
            BinaryOp::Log => lhs.log(rhs),
            BinaryOp::Root => lhs.root(rhs),
            BinaryOp::Min => lhs.min(rhs),
            BinaryOp::Max => lhs.max(rhs),
        }
    }

    /// Solve `lhs op known = target` for `lhs`
    fn invert_lhs(&self, known: Decimal, target: Decimal) -> Option<Decimal> {
        if !known.is_finite() {
            return None;
        }
        match self {
            BinaryOp::Add => Some(target - known),
            BinaryOp::Sub => Some(target + known),
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Pow | BinaryOp::Root
                if known.is_zero() =>
            {
                None
            }
            BinaryOp::Mul => Some(target / known),
            BinaryOp::Div => Some(target * known),
            BinaryOp::Pow => Some(target.root(known)),
            BinaryOp::Root => Some(target.pow(known)),
            BinaryOp::Log if !known.is_positive() || known == Decimal::ONE => None,
            BinaryOp::Log => Some(target.pow_base(known)),
            BinaryOp::Min | BinaryOp::Max => None,
        }
    }

    /// Solve `known op rhs = target` for `rhs`
    fn invert_rhs(&self, known: Decimal, target: Decimal) -> Option<Decimal> {
        if !known.is_finite() {
            return None;
        }
        match self {
            BinaryOp::Add => Some(target - known),
            BinaryOp::Sub => Some(known - target),
            BinaryOp::Mul if known.is_zero() => None,
            BinaryOp::Mul => Some(target / known),
            BinaryOp::Div if known.is_zero() || target.is_zero() => None,
            BinaryOp::Div => Some(known / target),
            // known ^ rhs = target
            BinaryOp::Pow if !known.is_positive() || known == Decimal::ONE => None,
            BinaryOp::Pow => Some(target.log(known)),
            // log_rhs(known) = target
            BinaryOp::Log if target.is_zero() || !known.is_positive() => None,
            BinaryOp::Log => Some(known.root(target)),
            // known ^ (1 / rhs) = target
            BinaryOp::Root
                if !known.is_positive()
                    || known == Decimal::ONE
                    || !target.is_positive()
                    || target == Decimal::ONE =>
            {
                None
            }
            BinaryOp::Root => Some(known.log(target)),
            BinaryOp::Min | BinaryOp::Max => None,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Variable,
    Constant(Decimal),
    Input(Source),
    Unary(UnaryOp, Box<Node>),
    Binary(BinaryOp, Box<Node>, Box<Node>),
    /// Below `threshold` the input passes through; above it only the excess is
    /// fed to `continuation`, whose own `Variable` is that excess.
    Step {
        input: Box<Node>,
        threshold: Box<Node>,
        continuation: Box<Node>,
    },
}

impl Node {
    fn eval(&self, x: Decimal) -> Decimal {
        match self {
            Node::Variable => x,
            Node::Constant(value) => *value,
            Node::Input(source) => source.get(),
            Node::Unary(op, inner) => op.apply(inner.eval(x)),
            Node::Binary(op, lhs, rhs) => op.apply(lhs.eval(x), rhs.eval(x)),
            Node::Step {
                input,
                threshold,
                continuation,
            } => {
                let value = input.eval(x);
                let threshold = threshold.eval(x);
                if value < threshold {
                    value
                } else {
                    threshold + continuation.eval(value - threshold)
                }
            }
        }
    }

    fn depends(&self) -> bool {
        match self {
            Node::Variable => true,
            Node::Constant(_) | Node::Input(_) => false,
            Node::Unary(_, inner) => inner.depends(),
            Node::Binary(_, lhs, rhs) => lhs.depends() || rhs.depends(),
            Node::Step {
                input, threshold, ..
            } => input.depends() || threshold.depends(),
        }
    }

    fn is_invertible(&self) -> bool {
        match self {
            Node::Variable => true,
            Node::Constant(_) | Node::Input(_) => false,
            Node::Unary(op, inner) => op.is_invertible() && inner.is_invertible(),
            Node::Binary(op, lhs, rhs) => {
                if matches!(op, BinaryOp::Min | BinaryOp::Max) {
                    return false;
                }
                match (lhs.depends(), rhs.depends()) {
                    (true, false) => lhs.is_invertible(),
                    (false, true) => rhs.is_invertible(),
                    _ => false,
                }
            }
            Node::Step {
                input,
                threshold,
                continuation,
            } => {
                !threshold.depends()
                    && input.is_invertible()
                    && continuation.is_invertible()
                    && continuation.is_softcap()
            }
        }
    }

    /// Maps 0 to 0 and increases strictly over non-negative inputs
    ///
    /// A step continuation must have this shape for the step to have a
    /// single root for every target.
    fn is_softcap(&self) -> bool {
        match self {
            Node::Variable => true,
            Node::Constant(_) | Node::Input(_) => false,
            Node::Unary(UnaryOp::Sqrt, inner) => inner.is_softcap(),
            Node::Unary(..) => false,
            Node::Binary(op, lhs, rhs) => match (lhs.depends(), rhs.depends()) {
                (true, false) => {
                    let known = rhs.eval(Decimal::ZERO);
                    let holds = match op {
                        BinaryOp::Add | BinaryOp::Sub => known.is_zero(),
                        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Pow | BinaryOp::Root => {
                            known.is_positive() && known.is_finite()
                        }
                        BinaryOp::Log | BinaryOp::Min | BinaryOp::Max => false,
                    };
                    holds && lhs.is_softcap()
                }
                (false, true) => {
                    let known = lhs.eval(Decimal::ZERO);
                    let holds = match op {
                        BinaryOp::Add => known.is_zero(),
                        BinaryOp::Mul => known.is_positive() && known.is_finite(),
                        _ => false,
                    };
                    holds && rhs.is_softcap()
                }
                _ => false,
            },
            Node::Step {
                input,
                threshold,
                continuation,
            } => {
                !threshold.depends()
                    && threshold.eval(Decimal::ZERO).is_positive()
                    && input.is_softcap()
                    && continuation.is_softcap()
            }
        }
    }

    /// The variable value producing `target`
    fn invert(&self, target: Decimal) -> Option<Decimal> {
        match self {
            Node::Variable => Some(target),
            Node::Constant(_) | Node::Input(_) => None,
            Node::Unary(op, inner) => inner.invert(op.invert(target)?),
            Node::Binary(op, lhs, rhs) => match (lhs.depends(), rhs.depends()) {
                (true, false) => lhs.invert(op.invert_lhs(rhs.eval(Decimal::ZERO), target)?),
                (false, true) => rhs.invert(op.invert_rhs(lhs.eval(Decimal::ZERO), target)?),
                _ => None,
            },
            Node::Step {
                input,
                threshold,
                continuation,
            } => {
                if threshold.depends() || !continuation.is_softcap() {
                    return None;
                }
                let threshold = threshold.eval(Decimal::ZERO);
                if target < threshold {
                    input.invert(target)
                } else {
                    let excess = continuation.invert(target - threshold)?;
                    input.invert(threshold + excess)
                }
            }
        }
    }
}

/// An expression tree over one variable
///
/// Combining two formulas bound to different variables treats the second one
/// as an independent live input.
#[derive(Debug, Clone)]
pub struct Formula {
    root: Node,
    variable: Option<Rc<Source>>,
}

impl Formula {
    /// A formula that is just its variable
    pub fn variable(source: impl Into<Source>) -> Self {
        Self {
            root: Node::Variable,
            variable: Some(Rc::new(source.into())),
        }
    }

    /// A constant formula
    pub fn constant(value: impl Into<Decimal>) -> Self {
        Self {
            root: Node::Constant(value.into()),
            variable: None,
        }
    }

    /// A formula reading a live input with no variable to solve for
    pub fn input(source: impl Into<Source>) -> Self {
        Self {
            root: Node::Input(source.into()),
            variable: None,
        }
    }

    /// Evaluate against the variable's current value
    pub fn evaluate(&self) -> Decimal {
        let x = self
            .variable
            .as_ref()
            .map(|source| source.get())
            .unwrap_or(Decimal::ZERO);
        self.root.eval(x)
    }

    /// Evaluate with the variable overridden
    pub fn evaluate_at(&self, x: impl Into<Decimal>) -> Decimal {
        self.root.eval(x.into())
    }

    /// Whether the result depends on the variable
    pub fn has_variable(&self) -> bool {
        self.variable.is_some() && self.root.depends()
    }

    /// Structural check: every node on the path to the variable has an inverse
    pub fn is_invertible(&self) -> bool {
        self.has_variable() && self.root.is_invertible()
    }

    /// The variable value that evaluates to `target`
    ///
    /// `None` when a node on the path has no inverse, an operand is degenerate,
    /// the result is not a number, or it does not evaluate back to `target`.
    pub fn invert(&self, target: impl Into<Decimal>) -> Option<Decimal> {
        if !self.has_variable() {
            return None;
        }
        let target = target.into();
        self.root
            .invert(target)
            .filter(|value| !value.is_nan() && self.solves(*value, target))
    }

    fn solves(&self, x: Decimal, target: Decimal) -> bool {
        let value = self.root.eval(x);
        value.approx_eq(target, INVERT_TOLERANCE)
            || (value - target).abs() <= Decimal::from(INVERT_TOLERANCE)
    }

    /// Closed-form inverse, falling back to bisection inside `bracket`
    ///
    /// The fallback assumes the formula is non-decreasing over the bracket and
    /// returns the largest point whose value does not exceed `target`.
    pub fn invert_or_search(
        &self,
        target: impl Into<Decimal>,
        bracket: Bracket,
        max_iterations: u32,
    ) -> Option<Decimal> {
        let target = target.into();
        self.invert(target).or_else(|| {
            search::bisect(|x| self.evaluate_at(x), target, bracket, max_iterations)
        })
    }

    fn unary(self, op: UnaryOp) -> Self {
        Self {
            root: Node::Unary(op, Box::new(self.root)),
            variable: self.variable,
        }
    }

    fn binary(self, op: BinaryOp, other: impl Into<Formula>) -> Self {
        let (lhs, rhs, variable) = Self::merge(self, other.into());
        Self {
            root: Node::Binary(op, Box::new(lhs), Box::new(rhs)),
            variable,
        }
    }

    /// Line up two trees on one variable binding
    fn merge(lhs: Formula, rhs: Formula) -> (Node, Node, Option<Rc<Source>>) {
        match (lhs.variable, rhs.variable) {
            (None, None) => (lhs.root, rhs.root, None),
            (Some(binding), None) | (None, Some(binding)) => (lhs.root, rhs.root, Some(binding)),
            (Some(left), Some(right)) if Rc::ptr_eq(&left, &right) => {
                (lhs.root, rhs.root, Some(left))
            }
            (Some(left), Some(right)) => {
                let detached = Formula {
                    root: rhs.root,
                    variable: Some(right),
                };
                (lhs.root, Node::Input(detached.into()), Some(left))
            }
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn add(self, other: impl Into<Formula>) -> Self {
        self.binary(BinaryOp::Add, other)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn sub(self, other: impl Into<Formula>) -> Self {
        self.binary(BinaryOp::Sub, other)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn mul(self, other: impl Into<Formula>) -> Self {
        self.binary(BinaryOp::Mul, other)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn div(self, other: impl Into<Formula>) -> Self {
        self.binary(BinaryOp::Div, other)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn neg(self) -> Self {
        self.unary(UnaryOp::Neg)
    }

    /// `self ^ exponent`
    pub fn pow(self, exponent: impl Into<Formula>) -> Self {
        self.binary(BinaryOp::Pow, exponent)
    }

    /// `base ^ self`
    pub fn pow_base(self, base: impl Into<Formula>) -> Self {
        base.into().binary(BinaryOp::Pow, self)
    }

    /// Logarithm of `self` in `base`
    pub fn log(self, base: impl Into<Formula>) -> Self {
        self.binary(BinaryOp::Log, base)
    }

    /// `n`-th root of `self`
    pub fn root(self, n: impl Into<Formula>) -> Self {
        self.binary(BinaryOp::Root, n)
    }

    /// The smaller of the two; never invertible
    pub fn min(self, other: impl Into<Formula>) -> Self {
        self.binary(BinaryOp::Min, other)
    }

    /// The larger of the two, often used as `max(x, 0)` to clamp a domain
    pub fn max(self, other: impl Into<Formula>) -> Self {
        self.binary(BinaryOp::Max, other)
    }

    pub fn sqrt(self) -> Self {
        self.unary(UnaryOp::Sqrt)
    }

    /// Natural logarithm
    pub fn ln(self) -> Self {
        self.unary(UnaryOp::Ln)
    }

    pub fn log10(self) -> Self {
        self.unary(UnaryOp::Log10)
    }

    /// `1 / self`
    pub fn recip(self) -> Self {
        self.unary(UnaryOp::Recip)
    }

    pub fn abs(self) -> Self {
        self.unary(UnaryOp::Abs)
    }

    /// Sine in radians; formulas through it report no inverse
    pub fn sin(self) -> Self {
        self.unary(UnaryOp::Sin)
    }

    /// Cosine in radians
    pub fn cos(self) -> Self {
        self.unary(UnaryOp::Cos)
    }

    /// Round down; blocks the closed-form inverse like `ceil` and `round`
    pub fn floor(self) -> Self {
        self.unary(UnaryOp::Floor)
    }

    pub fn ceil(self) -> Self {
        self.unary(UnaryOp::Ceil)
    }

    pub fn round(self) -> Self {
        self.unary(UnaryOp::Round)
    }

    /// Pass values below `threshold` through; transform only the excess above it
    ///
    /// `continuation` receives a formula over the excess. The result is
    /// `v` when `v < threshold`, else `threshold + continuation(v - threshold)`.
    pub fn step(
        self,
        threshold: impl Into<Formula>,
        continuation: impl FnOnce(Formula) -> Formula,
    ) -> Self {
        let excess_binding = Rc::new(Source::Constant(Decimal::ZERO));
        let excess = Formula {
            root: Node::Variable,
            variable: Some(Rc::clone(&excess_binding)),
        };
        let continued = continuation(excess);
        let continuation = match &continued.variable {
            Some(binding) if !Rc::ptr_eq(binding, &excess_binding) => {
                Node::Input(continued.into())
            }
            _ => continued.root,
        };

        let (input, threshold, variable) = Self::merge(self, threshold.into());
        Self {
            root: Node::Step {
                input: Box::new(input),
                threshold: Box::new(threshold),
                continuation: Box::new(continuation),
            },
            variable,
        }
    }
}

impl From<Decimal> for Formula {
    fn from(value: Decimal) -> Self {
        Formula::constant(value)
    }
}

impl From<f64> for Formula {
    fn from(value: f64) -> Self {
        Formula::constant(value)
    }
}

impl From<i32> for Formula {
    fn from(value: i32) -> Self {
        Formula::constant(value)
    }
}

impl From<Source> for Formula {
    fn from(source: Source) -> Self {
        match source {
            Source::Constant(value) => Formula::constant(value),
            other => Formula::input(other),
        }
    }
}

impl From<&Resource> for Formula {
    fn from(resource: &Resource) -> Self {
        Formula::input(resource)
    }
}

impl From<Formula> for Source {
    fn from(formula: Formula) -> Self {
        if let Node::Constant(value) = &formula.root {
            return Source::Constant(*value);
        }
        Source::computed(move || formula.evaluate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_evaluate_reads_variable() {
        let amount = Resource::new("amount", 2);
        let cost = Formula::variable(&amount).pow_base(1.5).mul(10);
        assert!(cost.evaluate().approx_eq(22.5, 1e-12));

        amount.set(0);
        assert_eq!(cost.evaluate(), Decimal::from(10));
        assert!(cost.evaluate_at(3).approx_eq(33.75, 1e-12));
    }

    #[test]
    fn test_invert_closed_form() {
        let x = Resource::new("x", 0);
        let formula = Formula::variable(&x).mul(3).add(1).pow(2);
        let target = formula.evaluate_at(7);
        let solved = formula.invert(target).unwrap();
        assert!(solved.approx_eq(7, 1e-12));

        let exponential = Formula::variable(&x).pow_base(2).mul(5);
        assert!(exponential.invert(5120).unwrap().approx_eq(10, 1e-12));

        let logarithmic = Formula::variable(&x).log(10).sub(1);
        assert!(logarithmic.invert(2).unwrap().approx_eq(1000, 1e-12));

        let divided = Formula::constant(100).div(Formula::variable(&x));
        assert!(divided.invert(4).unwrap().approx_eq(25, 1e-12));
    }

    #[test]
    fn test_invert_huge_values() {
        let x = Resource::new("x", 0);
        let formula = Formula::variable(&x).pow_base(10).sqrt();
        let solved = formula.invert(Decimal::pow10(5000)).unwrap();
        assert!(solved.approx_eq(10000, 1e-9));
    }

    #[test]
    fn test_not_invertible() {
        let x = Resource::new("x", 0);
        assert!(!Formula::variable(&x).sin().is_invertible());
        assert_eq!(Formula::variable(&x).sin().invert(0.5), None);
        assert_eq!(Formula::variable(&x).abs().invert(2), None);
        assert_eq!(Formula::variable(&x).floor().invert(2), None);
        assert_eq!(Formula::variable(&x).max(3).invert(5), None);

        assert_eq!(Formula::variable(&x).mul(0).invert(0), None);
        assert_eq!(Formula::constant(3).invert(3), None);
    }

    #[test]
    fn test_both_sides_share_variable() {
        let x = Resource::new("x", 3);
        let square = Formula::variable(&x).mul(Formula::variable(&x));
        // different bindings: the second is a live input, not the variable
        assert_eq!(square.evaluate(), Decimal::from(9));
        assert!(square.is_invertible());
        assert!(square.invert(12).unwrap().approx_eq(4, 1e-12));

        let base = Formula::variable(&x);
        let shared = base.clone().mul(base);
        assert!(!shared.is_invertible());
    }

    #[test]
    fn test_step() {
        let x = Resource::new("x", 0);
        let softcapped = Formula::variable(&x).step(100, |excess| excess.sqrt());

        assert_eq!(softcapped.evaluate_at(50), Decimal::from(50));
        assert_eq!(softcapped.evaluate_at(100), Decimal::from(100));
        assert!(softcapped.evaluate_at(200).approx_eq(110, 1e-12));

        assert!(softcapped.is_invertible());
        assert!(softcapped.invert(50).unwrap().approx_eq(50, 1e-12));
        assert!(softcapped.invert(110).unwrap().approx_eq(200, 1e-12));
    }

    #[test]
    fn test_step_with_non_invertible_continuation() {
        let x = Resource::new("x", 0);
        let formula = Formula::variable(&x).step(10, |excess| excess.floor());
        assert!(!formula.is_invertible());
        assert_eq!(formula.invert(20), None);
        assert_eq!(formula.evaluate_at(12.5), Decimal::from(12));
    }

    #[test]
    fn test_step_with_offset_continuation() {
        let x = Resource::new("x", 0);
        let formula = Formula::variable(&x).step(10, |excess| excess.add(5));
        assert_eq!(formula.evaluate_at(12), Decimal::from(17));
        assert!(!formula.is_invertible());
        assert_eq!(formula.invert(12), None);
        assert_eq!(formula.invert(17), None);

        let found = formula
            .invert_or_search(17, Bracket::new(0, 100), 200)
            .unwrap();
        assert!(found.approx_eq(12, 1e-9));
    }

    #[test]
    fn test_step_with_two_roots() {
        let x = Resource::new("x", 0);
        let formula = Formula::variable(&x).step(10, |excess| excess.neg().mul(0.5));
        assert_eq!(formula.evaluate_at(5), Decimal::from(5));
        assert_eq!(formula.evaluate_at(20), Decimal::from(5));
        assert!(!formula.is_invertible());
        assert_eq!(formula.invert(5), None);

        let shrunk = Formula::variable(&x).step(10, |excess| excess.mul(-2));
        assert!(!shrunk.is_invertible());
        assert_eq!(shrunk.invert(4), None);
    }

    #[test]
    fn test_nested_step_softcaps() {
        let x = Resource::new("x", 0);
        let formula = Formula::variable(&x)
            .step(100, |excess| excess.step(50, |inner| inner.pow(0.5)).mul(0.5));
        assert!(formula.is_invertible());
        let target = formula.evaluate_at(1000);
        assert!(formula.invert(target).unwrap().approx_eq(1000, 1e-9));
    }

    #[test]
    fn test_ambiguous_min_falls_back_to_search() {
        let x = Resource::new("x", 0);
        let capped = Formula::variable(&x).min(50).mul(2);
        assert!(!capped.is_invertible());
        assert_eq!(capped.invert(40), None);

        let found = capped
            .invert_or_search(40, Bracket::new(0, 1000), 200)
            .unwrap();
        assert!(found.approx_eq(20, 1e-9));
        // every input past the cap reaches 100; the search settles at the top
        let flat = capped
            .invert_or_search(100, Bracket::new(0, 1000), 200)
            .unwrap();
        assert_eq!(flat, Decimal::from(1000));
    }

    #[test]
    fn test_search_agrees_with_closed_form() {
        let x = Resource::new("x", 0);
        let formula = Formula::variable(&x).pow(2).mul(3).add(1);
        let closed = formula.invert(301).unwrap();
        let searched = search::bisect(
            |v| formula.evaluate_at(v),
            Decimal::from(301),
            Bracket::new(0, 1e6),
            200,
        )
        .unwrap();
        assert!(closed.approx_eq(10, 1e-12));
        assert!(searched.approx_eq(closed, 1e-9));
    }

    #[test]
    fn test_invert_or_search_falls_back() {
        let x = Resource::new("x", 0);
        let formula = Formula::variable(&x).abs().mul(2);
        let found = formula
            .invert_or_search(10, Bracket::new(0, 100), 200)
            .unwrap();
        assert!(found.approx_eq(5, 1e-9));
    }

    #[test]
    fn test_live_inputs() {
        let x = Resource::new("x", 2);
        let multiplier = Resource::new("multiplier", 3);
        let formula = Formula::variable(&x).mul(&multiplier);
        assert_eq!(formula.evaluate(), Decimal::from(6));

        multiplier.set(5);
        assert_eq!(formula.evaluate(), Decimal::from(10));
        assert!(formula.invert(20).unwrap().approx_eq(4, 1e-12));

        let source: Source = formula.into();
        assert_eq!(source.get(), Decimal::from(10));
    }

    fn continued(kind: u8, excess: Formula) -> Formula {
        match kind {
            0 => excess.sqrt(),
            1 => excess.pow(0.5),
            2 => excess.mul(0.25),
            3 => excess.pow(3),
            4 => excess.add(5),
            5 => excess.neg().mul(0.5),
            6 => excess.mul(2).add(1),
            _ => excess.sin(),
        }
    }

    proptest! {
        #[test]
        fn prop_step_inverse_evaluates_back(
            threshold in 1.0f64..1000.0,
            kind in 0u8..8,
            target in 0.0f64..1e6,
        ) {
            let x = Resource::new("x", 0);
            let formula = Formula::variable(&x).step(threshold, |excess| continued(kind, excess));
            let target = Decimal::from(target);
            if let Some(root) = formula.invert(target) {
                prop_assert!(formula.evaluate_at(root).approx_eq(target, 1e-6));
            }
            if kind < 4 {
                prop_assert!(formula.is_invertible());
                prop_assert!(formula.invert(target).is_some());
            } else {
                prop_assert!(!formula.is_invertible());
            }
        }
    }
}
