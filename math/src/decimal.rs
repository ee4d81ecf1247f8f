//! Exact decimal big numbers with explicit rounding.
//!
//! Every quantity in the engine (token amounts, sqrt prices, liquidity, fee
//! growth) is an arbitrary-precision decimal. Addition, subtraction and
//! multiplication are exact; division is performed at [`DECIMAL_PLACES`]
//! decimal places with an explicit [`Rounding`] mode. Nothing in this module
//! ever touches a machine float.
//!
//! [`UDecimal`] is the primary, non-negative type; [`SDecimal`] is the signed
//! wrapper used for `liquidityNet`, signed swap amounts and fee-growth
//! differences.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, Zero};
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::MathError;

/// Scale used for every division in the engine.
pub const DECIMAL_PLACES: i64 = 20;

/// Scale of user-facing token quantities; `f18` truncates to this.
pub const TOKEN_DECIMALS: i64 = 18;

/// Rounding direction for divisions and re-scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Toward negative infinity.
    Floor,
    /// Toward positive infinity.
    Ceil,
    /// Half away from zero on ties, the default for unconstrained divisions.
    HalfUp,
}

fn pow10(n: i64) -> BigInt {
    debug_assert!(n >= 0);
    BigInt::from(10u32).pow(n as u32)
}

/// Integer division of `num / den` with the requested rounding.
fn div_bigint(num: &BigInt, den: &BigInt, rounding: Rounding) -> BigInt {
    let (q, r) = num.div_rem(den);
    if r.is_zero() {
        return q;
    }
    let same_sign = num.is_negative() == den.is_negative();
    match rounding {
        Rounding::Floor => {
            if same_sign {
                q
            } else {
                q - 1
            }
        }
        Rounding::Ceil => {
            if same_sign {
                q + 1
            } else {
                q
            }
        }
        Rounding::HalfUp => {
            if r.abs() * 2u32 >= den.abs() {
                if same_sign {
                    q + 1
                } else {
                    q - 1
                }
            } else {
                q
            }
        }
    }
}

/// Re-expresses `(digits, scale)` at `target` decimal places.
fn rescale(digits: &BigInt, scale: i64, target: i64, rounding: Rounding) -> BigInt {
    if scale <= target {
        digits * pow10(target - scale)
    } else {
        div_bigint(digits, &pow10(scale - target), rounding)
    }
}

fn raw_div(
    a: &BigDecimal,
    b: &BigDecimal,
    scale: i64,
    rounding: Rounding,
    ctx: &'static str,
) -> Result<BigDecimal, MathError> {
    let (bn, be) = b.as_bigint_and_exponent();
    if bn.is_zero() {
        return Err(MathError::DivisionByZero(ctx));
    }
    let (an, ae) = a.as_bigint_and_exponent();
    // a/b at `scale` places: an * 10^(scale + be - ae) / bn, rounded.
    let shift = scale + be - ae;
    let q = if shift >= 0 {
        div_bigint(&(an * pow10(shift)), &bn, rounding)
    } else {
        div_bigint(&an, &(bn * pow10(-shift)), rounding)
    };
    Ok(BigDecimal::new(q, scale))
}

fn raw_round(v: &BigDecimal, dp: i64, rounding: Rounding) -> BigDecimal {
    let (n, scale) = v.as_bigint_and_exponent();
    if scale <= dp {
        return v.clone();
    }
    BigDecimal::new(rescale(&n, scale, dp, rounding), dp)
}

/// Canonical plain-decimal rendering: no exponent, no trailing fractional
/// zeros, `0` for zero. This exact form feeds commitment hashes, so it must
/// never change.
fn format_plain(v: &BigDecimal, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let (mut n, mut scale) = v.as_bigint_and_exponent();
    if n.is_zero() {
        return f.write_str("0");
    }
    let ten = BigInt::from(10u32);
    while scale > 0 {
        let (q, r) = n.div_rem(&ten);
        if !r.is_zero() {
            break;
        }
        n = q;
        scale -= 1;
    }
    let negative = n.is_negative();
    let mut digits = n.abs().to_string();
    if negative {
        f.write_str("-")?;
    }
    if scale <= 0 {
        digits.extend(std::iter::repeat('0').take((-scale) as usize));
        f.write_str(&digits)
    } else {
        let scale = scale as usize;
        if digits.len() <= scale {
            let mut out = String::from("0.");
            out.extend(std::iter::repeat('0').take(scale - digits.len()));
            out.push_str(&digits);
            f.write_str(&out)
        } else {
            let point = digits.len() - scale;
            f.write_str(&digits[..point])?;
            f.write_str(".")?;
            f.write_str(&digits[point..])
        }
    }
}

/// Non-negative arbitrary-precision decimal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UDecimal(BigDecimal);

impl UDecimal {
    pub fn zero() -> Self {
        UDecimal(BigDecimal::zero())
    }

    pub fn one() -> Self {
        UDecimal(BigDecimal::from(1))
    }

    /// Parses a decimal literal, rejecting negatives.
    pub fn new(s: &str) -> Result<Self, MathError> {
        let v = BigDecimal::from_str(s)
            .map_err(|_| MathError::InvalidDecimal(s.to_string()))?;
        if v.is_negative() {
            return Err(MathError::InvalidDecimal(s.to_string()));
        }
        Ok(UDecimal(v))
    }

    pub fn from_u64(v: u64) -> Self {
        UDecimal(BigDecimal::from(v))
    }

    pub(crate) fn from_bigdecimal(v: BigDecimal) -> Result<Self, MathError> {
        if v.is_negative() {
            return Err(MathError::UintOutOfBounds(format!("{v}")));
        }
        Ok(UDecimal(v))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn add(&self, rhs: &UDecimal) -> UDecimal {
        UDecimal(&self.0 + &rhs.0)
    }

    /// Unsigned subtraction; going below zero is an error, never a wrap.
    pub fn sub(&self, rhs: &UDecimal) -> Result<UDecimal, MathError> {
        if rhs.0 > self.0 {
            return Err(MathError::UintOutOfBounds(format!(
                "{} - {}",
                self, rhs
            )));
        }
        Ok(UDecimal(&self.0 - &rhs.0))
    }

    pub fn mul(&self, rhs: &UDecimal) -> UDecimal {
        UDecimal(&self.0 * &rhs.0)
    }

    /// Division at [`DECIMAL_PLACES`] with the given rounding.
    pub fn div(&self, rhs: &UDecimal, rounding: Rounding) -> Result<UDecimal, MathError> {
        Ok(UDecimal(raw_div(
            &self.0,
            &rhs.0,
            DECIMAL_PLACES,
            rounding,
            "UDecimal::div",
        )?))
    }

    /// Re-rounds to `dp` decimal places. A no-op when the value already has
    /// `dp` or fewer places.
    pub fn round(&self, dp: i64, rounding: Rounding) -> UDecimal {
        UDecimal(raw_round(&self.0, dp, rounding))
    }

    /// Truncates to 18 decimal places, FLOOR. Applied to user-facing token
    /// quantities at settlement.
    pub fn f18(&self) -> UDecimal {
        self.round(TOKEN_DECIMALS, Rounding::Floor)
    }

    pub fn min(&self, rhs: &UDecimal) -> UDecimal {
        if self <= rhs {
            self.clone()
        } else {
            rhs.clone()
        }
    }

    pub fn max(&self, rhs: &UDecimal) -> UDecimal {
        if self >= rhs {
            self.clone()
        } else {
            rhs.clone()
        }
    }

    pub fn to_signed(&self) -> SDecimal {
        SDecimal(self.0.clone())
    }
}

impl PartialOrd for UDecimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for UDecimal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Display for UDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_plain(&self.0, f)
    }
}

impl FromStr for UDecimal {
    type Err = MathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UDecimal::new(s)
    }
}

impl Serialize for UDecimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for UDecimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        UDecimal::new(&s).map_err(D::Error::custom)
    }
}

/// Signed arbitrary-precision decimal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SDecimal(BigDecimal);

impl SDecimal {
    pub fn zero() -> Self {
        SDecimal(BigDecimal::zero())
    }

    pub fn new(s: &str) -> Result<Self, MathError> {
        let v = BigDecimal::from_str(s)
            .map_err(|_| MathError::InvalidDecimal(s.to_string()))?;
        Ok(SDecimal(v))
    }

    pub fn from_i64(v: i64) -> Self {
        SDecimal(BigDecimal::from(v))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    pub fn add(&self, rhs: &SDecimal) -> SDecimal {
        SDecimal(&self.0 + &rhs.0)
    }

    pub fn sub(&self, rhs: &SDecimal) -> SDecimal {
        SDecimal(&self.0 - &rhs.0)
    }

    pub fn mul(&self, rhs: &SDecimal) -> SDecimal {
        SDecimal(&self.0 * &rhs.0)
    }

    pub fn div(&self, rhs: &SDecimal, rounding: Rounding) -> Result<SDecimal, MathError> {
        Ok(SDecimal(raw_div(
            &self.0,
            &rhs.0,
            DECIMAL_PLACES,
            rounding,
            "SDecimal::div",
        )?))
    }

    pub fn neg(&self) -> SDecimal {
        SDecimal(-&self.0)
    }

    pub fn abs(&self) -> UDecimal {
        UDecimal(self.0.abs())
    }

    pub fn round(&self, dp: i64, rounding: Rounding) -> SDecimal {
        SDecimal(raw_round(&self.0, dp, rounding))
    }

    /// Converts to unsigned; negative values are an error.
    pub fn into_unsigned(&self) -> Result<UDecimal, MathError> {
        UDecimal::from_bigdecimal(self.0.clone())
    }
}

impl From<&UDecimal> for SDecimal {
    fn from(v: &UDecimal) -> Self {
        v.to_signed()
    }
}

impl PartialOrd for SDecimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SDecimal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Display for SDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_plain(&self.0, f)
    }
}

impl FromStr for SDecimal {
    type Err = MathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SDecimal::new(s)
    }
}

impl Serialize for SDecimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SDecimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        SDecimal::new(&s).map_err(D::Error::custom)
    }
}
