//! Fixed-point decimal engine backed by rust_decimal.
//!
//! Every operation that can fail is checked and surfaces an [`ArithmeticError`]
//! instead of panicking. Conversions into integer base units always truncate
//! toward zero, matching on-chain integer division.

use super::primitives::BaseUnits;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal as RustDecimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Largest scale rust_decimal can represent.
pub const MAX_SCALE: u32 = 28;

/// Largest mantissa rust_decimal can hold (2^96 - 1).
const MAX_MANTISSA: u128 = 79_228_162_514_264_337_593_543_950_335;

/// Denominator of a basis-point ratio.
pub const BPS_DENOMINATOR: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArithmeticError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("arithmetic overflow")]
    Overflow,
    #[error("scale {0} exceeds the supported maximum of 28")]
    ScaleOutOfRange(u32),
    #[error("negative value cannot be expressed in base units")]
    NegativeAmount,
}

/// Rounding applied by [`Decimal::to_fixed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundingMode {
    /// Truncate: 1.9 -> 1, -1.9 -> -1.
    TowardZero,
    /// Floor: 1.9 -> 1, -1.9 -> -2.
    Down,
}

impl RoundingMode {
    fn strategy(self) -> RoundingStrategy {
        match self {
            RoundingMode::TowardZero => RoundingStrategy::ToZero,
            RoundingMode::Down => RoundingStrategy::ToNegativeInfinity,
        }
    }
}

/// Lossless decimal numeric type for position arithmetic.
///
/// Serializes to a JSON string so no precision is lost on the wire.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Decimal(#[serde(with = "rust_decimal::serde::str")] RustDecimal);

impl Decimal {
    pub fn new(value: RustDecimal) -> Self {
        Decimal(value)
    }

    /// Parse a Decimal from a string losslessly.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number.
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        RustDecimal::from_str(s).map(Decimal)
    }

    /// Format without trailing zeros or exponent notation.
    pub fn to_canonical_string(&self) -> String {
        format!("{}", self.0.normalize())
    }

    pub fn inner(&self) -> RustDecimal {
        self.0
    }

    pub fn zero() -> Self {
        Decimal(RustDecimal::ZERO)
    }

    pub fn one() -> Self {
        Decimal(RustDecimal::ONE)
    }

    /// `bps / 10000`, exact.
    pub fn from_bps(bps: u32) -> Self {
        Decimal(RustDecimal::new(i64::from(bps), 4))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    pub fn abs(&self) -> Self {
        Decimal(self.0.abs())
    }

    pub fn checked_add(self, rhs: Decimal) -> Result<Decimal, ArithmeticError> {
        self.0
            .checked_add(rhs.0)
            .map(Decimal)
            .ok_or(ArithmeticError::Overflow)
    }

    pub fn checked_sub(self, rhs: Decimal) -> Result<Decimal, ArithmeticError> {
        self.0
            .checked_sub(rhs.0)
            .map(Decimal)
            .ok_or(ArithmeticError::Overflow)
    }

    pub fn checked_mul(self, rhs: Decimal) -> Result<Decimal, ArithmeticError> {
        self.0
            .checked_mul(rhs.0)
            .map(Decimal)
            .ok_or(ArithmeticError::Overflow)
    }

    pub fn checked_div(self, rhs: Decimal) -> Result<Decimal, ArithmeticError> {
        if rhs.is_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }
        self.0
            .checked_div(rhs.0)
            .map(Decimal)
            .ok_or(ArithmeticError::Overflow)
    }

    /// Multiply, flooring any digits the 96-bit mantissa cannot hold.
    ///
    /// `checked_mul` rounds to nearest once a product outgrows 28 digits,
    /// which can land above the exact value.
    pub fn mul_floor(self, rhs: Decimal) -> Result<Decimal, ArithmeticError> {
        let (a, b) = (self.0.normalize(), rhs.0.normalize());
        let exact_scale = a.scale() + b.scale();

        let Some(mut mantissa) = a.mantissa().checked_mul(b.mantissa()) else {
            let product = Decimal(a).checked_mul(Decimal(b))?;
            if product.0.scale() >= exact_scale {
                return Ok(product);
            }
            return product.step_down();
        };

        let mut scale = exact_scale;
        while scale > MAX_SCALE || mantissa.unsigned_abs() > MAX_MANTISSA {
            if scale == 0 {
                return Err(ArithmeticError::Overflow);
            }
            mantissa = mantissa.div_euclid(10);
            scale -= 1;
        }
        RustDecimal::try_from_i128_with_scale(mantissa, scale)
            .map(Decimal)
            .map_err(|_| ArithmeticError::Overflow)
    }

    /// Divide and floor the quotient at `scale` decimal places.
    ///
    /// The result never exceeds the exact quotient, including when the
    /// quotient is too large to carry `scale` fractional digits.
    pub fn div_floor(self, rhs: Decimal, scale: u32) -> Result<Decimal, ArithmeticError> {
        if scale > MAX_SCALE {
            return Err(ArithmeticError::ScaleOutOfRange(scale));
        }
        let raw = self.checked_div(rhs)?;
        let quotient = Decimal(raw.0.normalize());
        let exact = !precision_exhausted(quotient.0) && quotient.checked_mul(rhs)? == self;
        let bound = if exact {
            quotient
        } else {
            // A rounded quotient sits at most half a unit above the exact value.
            let lower = raw.step_down()?;
            if lower.is_negative() && self.is_negative() == rhs.is_negative() {
                Decimal::zero()
            } else {
                lower
            }
        };
        bound.to_fixed(scale, RoundingMode::Down)
    }

    /// One unit lower in the last place this value carries.
    fn step_down(self) -> Result<Decimal, ArithmeticError> {
        self.checked_sub(Decimal(RustDecimal::new(1, self.0.scale())))
    }

    /// Round to `scale` decimal places with an explicit rounding mode.
    pub fn to_fixed(self, scale: u32, mode: RoundingMode) -> Result<Decimal, ArithmeticError> {
        if scale > MAX_SCALE {
            return Err(ArithmeticError::ScaleOutOfRange(scale));
        }
        Ok(Decimal(self.0.round_dp_with_strategy(scale, mode.strategy())))
    }

    /// Interpret an integer base-unit amount as a human-unit decimal.
    pub fn from_base_units(amount: BaseUnits, decimals: u8) -> Result<Decimal, ArithmeticError> {
        let scale = u32::from(decimals);
        if scale > MAX_SCALE {
            return Err(ArithmeticError::ScaleOutOfRange(scale));
        }
        let raw = i128::try_from(amount.as_u128()).map_err(|_| ArithmeticError::Overflow)?;
        RustDecimal::try_from_i128_with_scale(raw, scale)
            .map(Decimal)
            .map_err(|_| ArithmeticError::Overflow)
    }

    /// Convert a human-unit value into integer base units, truncating toward zero.
    pub fn to_base_units(self, decimals: u8) -> Result<BaseUnits, ArithmeticError> {
        if self.is_negative() {
            return Err(ArithmeticError::NegativeAmount);
        }
        let scale = u32::from(decimals);
        let truncated = self.to_fixed(scale, RoundingMode::TowardZero)?.0;
        let factor = 10i128
            .checked_pow(scale - truncated.scale())
            .ok_or(ArithmeticError::Overflow)?;
        let units = truncated
            .mantissa()
            .checked_mul(factor)
            .and_then(|v| v.to_u128())
            .ok_or(ArithmeticError::Overflow)?;
        Ok(BaseUnits::new(units))
    }
}

/// True when rust_decimal had no room left for another digit, so the value
/// may have been rounded.
fn precision_exhausted(value: RustDecimal) -> bool {
    value.scale() >= MAX_SCALE || value.mantissa().unsigned_abs() > MAX_MANTISSA / 10
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Decimal {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}

impl From<RustDecimal> for Decimal {
    fn from(value: RustDecimal) -> Self {
        Decimal(value)
    }
}

impl From<Decimal> for RustDecimal {
    fn from(value: Decimal) -> Self {
        value.0
    }
}

impl From<u32> for Decimal {
    fn from(value: u32) -> Self {
        Decimal(RustDecimal::from(value))
    }
}

impl std::ops::Neg for Decimal {
    type Output = Decimal;

    fn neg(self) -> Decimal {
        Decimal(-self.0)
    }
}
