//! Arbitrary-magnitude decimal numbers
//!
//! A [`Decimal`] stores a sign, a mantissa in `[1, 10)` and an integral exponent
//! held in an `f64`, so exponents up to [`MAX_EXPONENT`] stay exact. Every
//! operation returns a new value and none of them panic:
//!
//! - results past `±MAX_EXPONENT` saturate to [`Decimal::INFINITY`] /
//!   [`Decimal::NEG_INFINITY`] or flush to zero
//! - logarithms of non-positive values return [`Decimal::NEG_INFINITY`]
//! - undefined results (negative base with a fractional exponent, `0 / 0`,
//!   `inf - inf`) produce [`Decimal::NAN`], which poisons every later operation
//!
//! Ordering is total: NaN sorts above infinity and equals only itself.

use crate::error::{Error, Result};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::iter::{Product, Sum};
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};
use std::str::FromStr;
use std::sync::OnceLock;

/// Largest exponent magnitude before a value saturates
pub const MAX_EXPONENT: f64 = 9e15;

/// Exponent gap past which the smaller addend no longer affects a sum
const MAX_SIGNIFICANT_DIGITS: f64 = 17.0;

/// Exponents at or above this hold no fractional part
const INTEGRAL_EXPONENT: f64 = 16.0;

const MIN_POW10: i32 = -323;
const MAX_POW10: i32 = 308;

/// Correctly rounded `10^power` for the range representable by `f64`
fn pow10(power: i32) -> f64 {
    static TABLE: OnceLock<Vec<f64>> = OnceLock::new();
    if power > MAX_POW10 {
        return f64::INFINITY;
    }
    if power < MIN_POW10 {
        return 0.0;
    }
    let table = TABLE.get_or_init(|| {
        (MIN_POW10..=MAX_POW10)
            .map(|i| format!("1e{}", i).parse::<f64>().unwrap_or(0.0))
            .collect()
    });
    table[(power - MIN_POW10) as usize]
}

/// An arbitrary-magnitude number
#[derive(Debug, Clone, Copy)]
pub struct Decimal {
    /// -1, 0 or 1; 0 for zero and NaN
    sign: i8,
    /// `[1, 10)` for finite non-zero values, `INFINITY` or `NAN` for sentinels
    mantissa: f64,
    /// Integral power of ten
    exponent: f64,
}

impl Decimal {
    /// Zero
    pub const ZERO: Decimal = Decimal {
        sign: 0,
        mantissa: 0.0,
        exponent: 0.0,
    };
    /// One
    pub const ONE: Decimal = Decimal {
        sign: 1,
        mantissa: 1.0,
        exponent: 0.0,
    };
    /// Ten
    pub const TEN: Decimal = Decimal {
        sign: 1,
        mantissa: 1.0,
        exponent: 1.0,
    };
    /// Positive saturation bound
    pub const INFINITY: Decimal = Decimal {
        sign: 1,
        mantissa: f64::INFINITY,
        exponent: 0.0,
    };
    /// Negative saturation bound
    pub const NEG_INFINITY: Decimal = Decimal {
        sign: -1,
        mantissa: f64::INFINITY,
        exponent: 0.0,
    };
    /// Poison value for undefined results
    pub const NAN: Decimal = Decimal {
        sign: 0,
        mantissa: f64::NAN,
        exponent: 0.0,
    };

    /// Build from a signed mantissa and a power of ten, normalizing both
    ///
    /// Neither argument needs to be normalized: `from_mantissa_exponent(250.0, 3.0)`
    /// is `2.5e5`, and a fractional exponent is folded into the mantissa.
    pub fn from_mantissa_exponent(mantissa: f64, exponent: f64) -> Self {
        if mantissa.is_nan() || exponent.is_nan() {
            return Self::NAN;
        }
        if mantissa == 0.0 {
            return Self::ZERO;
        }
        let sign: i8 = if mantissa < 0.0 { -1 } else { 1 };
        if mantissa.is_infinite() || exponent == f64::INFINITY {
            return Self::saturated(sign);
        }
        if exponent == f64::NEG_INFINITY {
            return Self::ZERO;
        }

        let mut m = mantissa.abs();
        let mut e = exponent.floor();
        let fraction = exponent - e;
        if fraction != 0.0 {
            m *= 10f64.powf(fraction);
        }
        // Subnormal mantissas lose precision under log10
        if m < 1e-300 {
            m *= 1e300;
            e -= 300.0;
        }
        let shift = m.log10().floor() as i32;
        if shift > 0 {
            m /= pow10(shift);
        } else if shift < 0 {
            m *= pow10(-shift);
        }
        e += f64::from(shift);
        if m >= 10.0 {
            m /= 10.0;
            e += 1.0;
        } else if m < 1.0 {
            m *= 10.0;
            e -= 1.0;
        }

        if e > MAX_EXPONENT {
            Self::saturated(sign)
        } else if e < -MAX_EXPONENT {
            Self::ZERO
        } else {
            Self {
                sign,
                mantissa: m,
                exponent: e,
            }
        }
    }

    /// Build from a native float
    pub fn from_f64(value: f64) -> Self {
        Self::from_mantissa_exponent(value, 0.0)
    }

    /// `10^power`, saturating outside `±MAX_EXPONENT`
    pub fn pow10(power: impl Into<Decimal>) -> Self {
        Self::pow10_f64(power.into().to_f64())
    }

    fn pow10_f64(power: f64) -> Self {
        if power.is_nan() {
            return Self::NAN;
        }
        if power > MAX_EXPONENT {
            return Self::INFINITY;
        }
        if power < -MAX_EXPONENT {
            return Self::ZERO;
        }
        let whole = power.floor();
        Self::from_mantissa_exponent(10f64.powf(power - whole), whole)
    }

    fn saturated(sign: i8) -> Self {
        if sign < 0 {
            Self::NEG_INFINITY
        } else {
            Self::INFINITY
        }
    }

    /// Normalized mantissa, signed; `NaN` for NaN and `±inf` for sentinels
    pub fn mantissa(&self) -> f64 {
        match self.sign {
            -1 => -self.mantissa,
            _ => self.mantissa,
        }
    }

    /// Normalized power of ten (0 for zero and sentinels)
    pub fn exponent(&self) -> f64 {
        self.exponent
    }

    /// -1, 0 or 1 (0 for NaN)
    pub fn signum(&self) -> i8 {
        self.sign
    }

    /// Convert to a native float, saturating to `±inf` or `0.0`
    pub fn to_f64(&self) -> f64 {
        if self.is_nan() {
            return f64::NAN;
        }
        if self.sign == 0 {
            return 0.0;
        }
        let signed = f64::from(self.sign);
        if self.is_infinite() || self.exponent > f64::from(MAX_POW10) {
            return signed * f64::INFINITY;
        }
        if self.exponent < f64::from(MIN_POW10) - 1.0 {
            return 0.0;
        }
        let e = self.exponent as i32;
        if e < -300 {
            signed * self.mantissa * pow10(e + 300) * 1e-300
        } else {
            signed * self.mantissa * pow10(e)
        }
    }

    /// Check for the NaN poison value
    pub fn is_nan(&self) -> bool {
        self.mantissa.is_nan()
    }

    /// Check for either saturation bound
    pub fn is_infinite(&self) -> bool {
        self.mantissa.is_infinite()
    }

    /// Neither NaN nor saturated
    pub fn is_finite(&self) -> bool {
        self.mantissa.is_finite()
    }

    /// Check for zero
    pub fn is_zero(&self) -> bool {
        self.sign == 0 && !self.is_nan()
    }

    /// Strictly greater than zero (false for NaN)
    pub fn is_positive(&self) -> bool {
        self.sign > 0
    }

    /// Strictly less than zero (false for NaN)
    pub fn is_negative(&self) -> bool {
        self.sign < 0
    }

    /// Whether this value has no fractional part
    pub fn is_integer(&self) -> bool {
        if !self.is_finite() {
            return false;
        }
        if self.sign == 0 || self.exponent >= INTEGRAL_EXPONENT {
            return true;
        }
        self.to_f64().fract() == 0.0
    }

    fn is_odd_integer(&self) -> bool {
        if !self.is_integer() || self.exponent >= INTEGRAL_EXPONENT {
            return false;
        }
        self.to_f64() % 2.0 != 0.0
    }

    fn log10_f64(&self) -> f64 {
        if self.is_nan() {
            return f64::NAN;
        }
        if self.sign <= 0 {
            return f64::NEG_INFINITY;
        }
        if self.is_infinite() {
            return f64::INFINITY;
        }
        self.exponent + self.mantissa.log10()
    }

    fn fits_f64(&self) -> bool {
        self.is_finite() && self.exponent.abs() <= 300.0
    }

    /// Absolute value
    pub fn abs(self) -> Self {
        if self.sign < 0 {
            Self { sign: 1, ..self }
        } else {
            self
        }
    }

    /// Reciprocal; `recip(0)` saturates to `INFINITY`
    pub fn recip(self) -> Self {
        if self.is_nan() {
            return Self::NAN;
        }
        if self.sign == 0 {
            return Self::INFINITY;
        }
        if self.is_infinite() {
            return Self::ZERO;
        }
        Self::from_mantissa_exponent(f64::from(self.sign) / self.mantissa, -self.exponent)
    }

    /// Raise to a power
    ///
    /// A negative base with a non-integral exponent yields NaN.
    pub fn pow(self, power: impl Into<Decimal>) -> Self {
        let power = power.into();
        if self.is_nan() || power.is_nan() {
            return Self::NAN;
        }
        if power.is_zero() {
            return Self::ONE;
        }
        if self.is_zero() {
            return if power.is_positive() {
                Self::ZERO
            } else {
                Self::INFINITY
            };
        }
        if self.sign < 0 {
            if !power.is_integer() {
                return Self::NAN;
            }
            let magnitude = self.abs().pow(power);
            return if power.is_odd_integer() {
                -magnitude
            } else {
                magnitude
            };
        }
        if self == Self::ONE {
            return Self::ONE;
        }
        if self.is_infinite() {
            return if power.is_positive() {
                Self::INFINITY
            } else {
                Self::ZERO
            };
        }
        if self.fits_f64() && power.fits_f64() {
            let direct = self.to_f64().powf(power.to_f64());
            if direct.is_finite() && direct.abs() >= 1e-300 {
                return Self::from_f64(direct);
            }
        }
        let log = self.log10_f64() * power.to_f64();
        if log.is_nan() {
            // log10(self) is tiny and power saturated: 1^inf style
            return Self::ONE;
        }
        Self::pow10_f64(log)
    }

    /// `base^self`
    pub fn pow_base(self, base: impl Into<Decimal>) -> Self {
        base.into().pow(self)
    }

    /// Square root; NaN for negative values
    pub fn sqrt(self) -> Self {
        self.pow(0.5)
    }

    /// `n`-th root
    pub fn root(self, n: impl Into<Decimal>) -> Self {
        self.pow(n.into().recip())
    }

    /// Base-10 logarithm; non-positive input returns `NEG_INFINITY`
    pub fn log10(self) -> Self {
        Self::from_f64(self.log10_f64())
    }

    /// Natural logarithm; non-positive input returns `NEG_INFINITY`
    pub fn ln(self) -> Self {
        Self::from_f64(self.log10_f64() * std::f64::consts::LN_10)
    }

    /// Logarithm in an arbitrary base
    ///
    /// Non-positive input returns `NEG_INFINITY`; a base that is non-positive or
    /// equal to one has no logarithm and yields NaN.
    pub fn log(self, base: impl Into<Decimal>) -> Self {
        let base = base.into();
        if self.is_nan() || base.is_nan() || base.sign <= 0 || base == Self::ONE {
            return Self::NAN;
        }
        if self.sign <= 0 {
            return Self::NEG_INFINITY;
        }
        Self::from_f64(self.log10_f64() / base.log10_f64())
    }

    /// Sine of the value in radians
    pub fn sin(self) -> Self {
        Self::from_f64(self.to_f64().sin())
    }

    /// Cosine of the value in radians
    pub fn cos(self) -> Self {
        Self::from_f64(self.to_f64().cos())
    }

    /// Round toward negative infinity
    pub fn floor(self) -> Self {
        self.round_with(f64::floor)
    }

    /// Round toward positive infinity
    pub fn ceil(self) -> Self {
        self.round_with(f64::ceil)
    }

    /// Round half away from zero
    pub fn round(self) -> Self {
        self.round_with(f64::round)
    }

    fn round_with(self, op: fn(f64) -> f64) -> Self {
        if !self.is_finite() || self.exponent >= INTEGRAL_EXPONENT {
            return self;
        }
        Self::from_f64(op(self.to_f64()))
    }

    /// Smaller of two values (NaN if either is NaN)
    pub fn min(self, other: impl Into<Decimal>) -> Self {
        let other = other.into();
        if self.is_nan() || other.is_nan() {
            return Self::NAN;
        }
        if other < self {
            other
        } else {
            self
        }
    }

    /// Larger of two values (NaN if either is NaN)
    pub fn max(self, other: impl Into<Decimal>) -> Self {
        let other = other.into();
        if self.is_nan() || other.is_nan() {
            return Self::NAN;
        }
        if other > self {
            other
        } else {
            self
        }
    }

    /// Restrict to `[low, high]`
    pub fn clamp(self, low: impl Into<Decimal>, high: impl Into<Decimal>) -> Self {
        self.max(low).min(high)
    }

    /// Relative comparison, for values carried through lossy float math
    ///
    /// Exactly equal values (including two NaNs or two equal infinities) always
    /// match; otherwise `|a - b| <= tolerance * max(|a|, |b|)`.
    pub fn approx_eq(self, other: impl Into<Decimal>, tolerance: f64) -> bool {
        let other = other.into();
        if self == other {
            return true;
        }
        if !self.is_finite() || !other.is_finite() {
            return false;
        }
        let diff = (self - other).abs();
        let scale = self.abs().max(other.abs());
        diff <= scale * tolerance
    }

    fn add_decimal(self, other: Decimal) -> Self {
        if self.is_nan() || other.is_nan() {
            return Self::NAN;
        }
        if self.is_infinite() {
            if other.is_infinite() && other.sign != self.sign {
                return Self::NAN;
            }
            return self;
        }
        if other.is_infinite() {
            return other;
        }
        if self.sign == 0 {
            return other;
        }
        if other.sign == 0 {
            return self;
        }
        let (big, small) = if self.exponent >= other.exponent {
            (self, other)
        } else {
            (other, self)
        };
        let gap = big.exponent - small.exponent;
        if gap > MAX_SIGNIFICANT_DIGITS {
            return big;
        }
        let mantissa = big.mantissa() + small.mantissa() * pow10(-(gap as i32));
        Self::from_mantissa_exponent(mantissa, big.exponent)
    }

    fn mul_decimal(self, other: Decimal) -> Self {
        if self.is_nan() || other.is_nan() {
            return Self::NAN;
        }
        let sign = self.sign * other.sign;
        if self.is_infinite() || other.is_infinite() {
            return if sign == 0 {
                Self::NAN
            } else {
                Self::saturated(sign)
            };
        }
        if sign == 0 {
            return Self::ZERO;
        }
        Self::from_mantissa_exponent(
            f64::from(sign) * self.mantissa * other.mantissa,
            self.exponent + other.exponent,
        )
    }

    fn div_decimal(self, other: Decimal) -> Self {
        if self.is_nan() || other.is_nan() {
            return Self::NAN;
        }
        if other.sign == 0 {
            return if self.sign == 0 {
                Self::NAN
            } else {
                Self::saturated(self.sign)
            };
        }
        if self.is_infinite() {
            return if other.is_infinite() {
                Self::NAN
            } else {
                Self::saturated(self.sign * other.sign)
            };
        }
        if other.is_infinite() || self.sign == 0 {
            return Self::ZERO;
        }
        Self::from_mantissa_exponent(
            f64::from(self.sign * other.sign) * self.mantissa / other.mantissa,
            self.exponent - other.exponent,
        )
    }

    fn cmp_magnitude(&self, other: &Self) -> Ordering {
        match (self.is_infinite(), other.is_infinite()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self
                .exponent
                .total_cmp(&other.exponent)
                .then(self.mantissa.total_cmp(&other.mantissa)),
        }
    }
}

impl Default for Decimal {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_nan(), other.is_nan()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            (false, false) => {}
        }
        if self.sign != other.sign {
            return self.sign.cmp(&other.sign);
        }
        match self.sign {
            0 => Ordering::Equal,
            1 => self.cmp_magnitude(other),
            _ => self.cmp_magnitude(other).reverse(),
        }
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Decimal {}

impl<T: Into<Decimal>> Add<T> for Decimal {
    type Output = Decimal;

    fn add(self, rhs: T) -> Decimal {
        self.add_decimal(rhs.into())
    }
}

impl<T: Into<Decimal>> Sub<T> for Decimal {
    type Output = Decimal;

    fn sub(self, rhs: T) -> Decimal {
        self.add_decimal(-rhs.into())
    }
}

impl<T: Into<Decimal>> Mul<T> for Decimal {
    type Output = Decimal;

    fn mul(self, rhs: T) -> Decimal {
        self.mul_decimal(rhs.into())
    }
}

impl<T: Into<Decimal>> Div<T> for Decimal {
    type Output = Decimal;

    fn div(self, rhs: T) -> Decimal {
        self.div_decimal(rhs.into())
    }
}

impl<T: Into<Decimal>> AddAssign<T> for Decimal {
    fn add_assign(&mut self, rhs: T) {
        *self = self.add_decimal(rhs.into());
    }
}

impl<T: Into<Decimal>> SubAssign<T> for Decimal {
    fn sub_assign(&mut self, rhs: T) {
        *self = self.add_decimal(-rhs.into());
    }
}

impl<T: Into<Decimal>> MulAssign<T> for Decimal {
    fn mul_assign(&mut self, rhs: T) {
        *self = self.mul_decimal(rhs.into());
    }
}

impl<T: Into<Decimal>> DivAssign<T> for Decimal {
    fn div_assign(&mut self, rhs: T) {
        *self = self.div_decimal(rhs.into());
    }
}

impl Neg for Decimal {
    type Output = Decimal;

    fn neg(self) -> Decimal {
        Self {
            sign: -self.sign,
            ..self
        }
    }
}

impl Sum for Decimal {
    fn sum<I: Iterator<Item = Decimal>>(iter: I) -> Self {
        iter.fold(Decimal::ZERO, |acc, x| acc + x)
    }
}

impl Product for Decimal {
    fn product<I: Iterator<Item = Decimal>>(iter: I) -> Self {
        iter.fold(Decimal::ONE, |acc, x| acc * x)
    }
}

impl From<f64> for Decimal {
    fn from(value: f64) -> Self {
        Self::from_f64(value)
    }
}

impl From<f32> for Decimal {
    fn from(value: f32) -> Self {
        Self::from_f64(f64::from(value))
    }
}

impl From<i32> for Decimal {
    fn from(value: i32) -> Self {
        Self::from_f64(f64::from(value))
    }
}

impl From<u32> for Decimal {
    fn from(value: u32) -> Self {
        Self::from_f64(f64::from(value))
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Self::from_f64(value as f64)
    }
}

impl From<u64> for Decimal {
    fn from(value: u64) -> Self {
        Self::from_f64(value as f64)
    }
}

impl From<usize> for Decimal {
    fn from(value: usize) -> Self {
        Self::from_f64(value as f64)
    }
}

impl From<&Decimal> for Decimal {
    fn from(value: &Decimal) -> Self {
        *value
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nan() {
            return write!(f, "NaN");
        }
        if self.is_infinite() {
            return if self.sign < 0 {
                write!(f, "-Infinity")
            } else {
                write!(f, "Infinity")
            };
        }
        if self.sign == 0 || (-6.0..=15.0).contains(&self.exponent) {
            return write!(f, "{}", self.to_f64());
        }
        write!(f, "{}e{}", self.mantissa(), self.exponent)
    }
}

impl FromStr for Decimal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let text = s.trim();
        match text {
            "NaN" => return Ok(Self::NAN),
            "Infinity" | "+Infinity" | "inf" => return Ok(Self::INFINITY),
            "-Infinity" | "-inf" => return Ok(Self::NEG_INFINITY),
            _ => {}
        }
        let invalid = || Error::InvalidDecimal(s.to_string());
        match text.split_once(|c| c == 'e' || c == 'E') {
            Some((mantissa, exponent)) => {
                let mantissa: f64 = mantissa.parse().map_err(|_| invalid())?;
                let exponent: f64 = exponent.parse().map_err(|_| invalid())?;
                Ok(Self::from_mantissa_exponent(mantissa, exponent))
            }
            None => text.parse::<f64>().map(Self::from_f64).map_err(|_| invalid()),
        }
    }
}

impl Serialize for Decimal {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(DecimalVisitor)
    }
}

struct DecimalVisitor;

impl<'de> Visitor<'de> for DecimalVisitor {
    type Value = Decimal;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a number or a decimal string such as \"1.5e1000\"")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Decimal, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Decimal, E> {
        Ok(Decimal::from_f64(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Decimal, E> {
        Ok(Decimal::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Decimal, E> {
        Ok(Decimal::from(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_normalized_equality() {
        assert_eq!(Decimal::from_mantissa_exponent(250.0, 3.0), d("2.5e5"));
        assert_eq!(Decimal::from_mantissa_exponent(0.025, 7.0), d("2.5e5"));
        assert_eq!(Decimal::from(250_000), d("2.5e5"));
        assert_eq!(Decimal::from(100.0).mantissa(), 1.0);
        assert_eq!(Decimal::from(100.0).exponent(), 2.0);
    }

    #[test]
    fn test_basic_arithmetic() {
        let a = Decimal::from(100);
        assert_eq!(a / 10, Decimal::from(10));
        assert_eq!(a + 50, Decimal::from(150));
        assert_eq!(a - 150, Decimal::from(-50));
        assert_eq!(a * 3, Decimal::from(300));
        assert_eq!(Decimal::from(2).pow(10), Decimal::from(1024));
        assert_eq!(Decimal::from(100).sqrt(), Decimal::from(10));
        assert_eq!(Decimal::from(1000).log10(), Decimal::from(3));
        assert!(Decimal::from(8).log(2).approx_eq(3, 1e-12));
    }

    #[test]
    fn test_huge_exponents() {
        let big = d("1e1000000000");
        assert_eq!(big.exponent(), 1e9);
        assert_eq!(big * big, d("1e2000000000"));
        assert_eq!(big.log10(), Decimal::from(1e9));
        assert_eq!(big.sqrt(), d("1e500000000"));
        // Far smaller addends vanish
        assert_eq!(big + 1, big);
        assert!(big.to_f64().is_infinite());
    }

    #[test]
    fn test_saturation() {
        let big = d("1e8000000000000000");
        assert_eq!(big * big, Decimal::INFINITY);
        assert_eq!(-(big * big), Decimal::NEG_INFINITY);
        assert_eq!(big.recip() * big.recip(), Decimal::ZERO);
        assert_eq!(Decimal::ONE / 0, Decimal::INFINITY);
        assert_eq!(Decimal::from(-1) / 0, Decimal::NEG_INFINITY);
        assert_eq!(Decimal::pow10(1e17), Decimal::INFINITY);
        assert_eq!(Decimal::pow10(-1e17), Decimal::ZERO);
    }

    #[test]
    fn test_log_of_non_positive_saturates() {
        assert_eq!(Decimal::ZERO.log10(), Decimal::NEG_INFINITY);
        assert_eq!(Decimal::from(-5).ln(), Decimal::NEG_INFINITY);
        assert_eq!(Decimal::from(-5).log(2), Decimal::NEG_INFINITY);
    }

    #[test]
    fn test_nan_poisons() {
        let poisoned = Decimal::from(-8).pow(0.5);
        assert!(poisoned.is_nan());
        assert!((poisoned + 1).is_nan());
        assert!((poisoned * 0).is_nan());
        assert!(poisoned.max(5).is_nan());
        assert!(poisoned.abs().floor().is_nan());
        // Integer powers of negative bases stay defined
        assert_eq!(Decimal::from(-2).pow(3), Decimal::from(-8));
        assert_eq!(Decimal::from(-2).pow(2), Decimal::from(4));
        assert!((Decimal::INFINITY - Decimal::INFINITY).is_nan());
        assert!((Decimal::ZERO / 0).is_nan());
    }

    #[test]
    fn test_total_ordering() {
        let mut values = vec![
            Decimal::NAN,
            Decimal::from(5),
            Decimal::NEG_INFINITY,
            d("-1e500"),
            Decimal::ZERO,
            Decimal::INFINITY,
            d("1e500"),
            d("-0.5"),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![
                Decimal::NEG_INFINITY,
                d("-1e500"),
                d("-0.5"),
                Decimal::ZERO,
                Decimal::from(5),
                d("1e500"),
                Decimal::INFINITY,
                Decimal::NAN,
            ]
        );
        assert_eq!(Decimal::NAN, Decimal::NAN);
    }

    #[test]
    fn test_rounding() {
        assert_eq!(Decimal::from(2.5).floor(), Decimal::from(2));
        assert_eq!(Decimal::from(2.5).ceil(), Decimal::from(3));
        assert_eq!(Decimal::from(-2.5).floor(), Decimal::from(-3));
        assert_eq!(Decimal::from(2.5).round(), Decimal::from(3));
        let big = d("1.5e40");
        assert_eq!(big.floor(), big);
    }

    #[test]
    fn test_trig() {
        assert!(Decimal::ZERO.sin().is_zero());
        assert_eq!(Decimal::ZERO.cos(), Decimal::ONE);
        assert!(Decimal::from(std::f64::consts::FRAC_PI_2)
            .sin()
            .approx_eq(1, 1e-12));
        assert!(d("1e500").sin().is_nan());
    }

    #[test]
    fn test_display_and_parse() {
        assert_eq!(Decimal::from(1024).to_string(), "1024");
        assert_eq!(Decimal::from(0.5).to_string(), "0.5");
        assert_eq!(d("1.5e1000").to_string(), "1.5e1000");
        assert_eq!(Decimal::INFINITY.to_string(), "Infinity");
        assert_eq!(d("Infinity"), Decimal::INFINITY);
        assert!(d("NaN").is_nan());
        assert!("twelve".parse::<Decimal>().is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let value = d("-3.25e123456789");
        let text = ron::to_string(&value).unwrap();
        let back: Decimal = ron::from_str(&text).unwrap();
        assert_eq!(back, value);

        let from_number: Decimal = ron::from_str("42.5").unwrap();
        assert_eq!(from_number, Decimal::from(42.5));
    }

    proptest! {
        #[test]
        fn prop_add_then_sub_recovers(a in -1e12f64..1e12, b in -1e12f64..1e12) {
            let x = Decimal::from(a);
            let y = Decimal::from(b);
            let error = (((x + y) - y) - x).abs();
            prop_assert!(error <= x.abs().max(y.abs()) * 1e-12);
        }

        #[test]
        fn prop_mul_then_div_recovers(m in 1.0f64..10.0, e in -1e9f64..1e9, k in 1e-6f64..1e6) {
            let x = Decimal::from_mantissa_exponent(m, e.floor());
            prop_assert!(((x * k) / k).approx_eq(x, 1e-12));
        }

        #[test]
        fn prop_ordering_is_monotone(a in -1e300f64..1e300, b in -1e300f64..1e300) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(Decimal::from(low) <= Decimal::from(high));
        }
    }
}
