//! Bounded monotone search for formulas without a closed-form inverse

use crate::Decimal;

/// An inclusive search interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bracket {
    pub low: Decimal,
    pub high: Decimal,
}

impl Bracket {
    /// Interval from `low` to `high`; an inverted pair makes every search fail
    pub fn new(low: impl Into<Decimal>, high: impl Into<Decimal>) -> Self {
        Self {
            low: low.into(),
            high: high.into(),
        }
    }
}

/// Ratio above which the midpoint is taken geometrically
const GEOMETRIC_RATIO: f64 = 8.0;

fn midpoint(low: Decimal, high: Decimal) -> Decimal {
    if low.is_positive() && high > low * GEOMETRIC_RATIO {
        (low * high).sqrt()
    } else if !low.is_positive() && high > Decimal::from(GEOMETRIC_RATIO) {
        high.sqrt()
    } else {
        (low + high) / 2
    }
}

/// Largest point of `bracket` where a non-decreasing `f` stays `<= target`
///
/// Returns `None` when even `f(low)` exceeds the target. Stops after
/// `max_iterations` halvings and returns the best lower bound found.
pub fn bisect(
    f: impl Fn(Decimal) -> Decimal,
    target: Decimal,
    bracket: Bracket,
    max_iterations: u32,
) -> Option<Decimal> {
    let Bracket { mut low, mut high } = bracket;
    if low.is_nan() || high.is_nan() || target.is_nan() || low > high {
        return None;
    }
    if f(low) > target {
        return None;
    }
    if f(high) <= target {
        return Some(high);
    }
    for _ in 0..max_iterations {
        let mid = midpoint(low, high);
        if mid <= low || mid >= high {
            break;
        }
        if f(mid) <= target {
            low = mid;
        } else {
            high = mid;
        }
    }
    Some(low)
}

/// Largest integer in `[low, high]` satisfying a monotone predicate
///
/// The predicate must hold for every integer below any integer it holds for.
/// Returns `None` when it fails at `low`.
pub fn bisect_integer(
    predicate: impl Fn(Decimal) -> bool,
    low: Decimal,
    high: Decimal,
    max_iterations: u32,
) -> Option<Decimal> {
    let mut low = low.floor();
    let mut high = high.floor();
    if low.is_nan() || high.is_nan() || low > high || !predicate(low) {
        return None;
    }
    if predicate(high) {
        return Some(high);
    }
    // invariant: predicate(low) holds, predicate(high) fails
    for _ in 0..max_iterations {
        if high - low <= Decimal::ONE {
            break;
        }
        let mid = midpoint(low, high).floor();
        let mid = if mid <= low { low + 1 } else { mid };
        if predicate(mid) {
            low = mid;
        } else {
            high = mid;
        }
    }
    Some(low)
}
