//! Exact decimal quantities for the derivation formulas.
//!
//! Every coefficient in the model is a multiple of 0.05 and every input is an
//! integer, so all intermediate values are exact multiples of 0.0001. Working
//! in those units keeps the derivation free of binary floating-point drift;
//! conversion to `f64` only happens once, after rounding.

use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// Number of fixed-point units per whole unit.
pub const SCALE: i64 = 10_000;

const UNITS_PER_TENTH: i64 = SCALE / 10;

/// A decimal value stored as an integer number of 0.0001 units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fixed(i64);

impl Fixed {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// Creates a value from raw 0.0001 units.
    #[must_use]
    pub const fn from_units(units: i64) -> Self {
        Self(units)
    }

    /// Creates a value from a whole number.
    #[must_use]
    pub const fn from_int(value: i64) -> Self {
        Self(value * SCALE)
    }

    /// Creates a value from a number of tenths (`from_tenths(5) == 0.5`).
    #[must_use]
    pub const fn from_tenths(tenths: i64) -> Self {
        Self(tenths * UNITS_PER_TENTH)
    }

    /// Raw 0.0001 units.
    #[must_use]
    pub const fn units(self) -> i64 {
        self.0
    }

    /// Multiplies by `numerator / denominator`.
    ///
    /// Callers only use ratios that divide the operand exactly; any remainder
    /// is truncated toward zero.
    #[must_use]
    pub const fn scale_by(self, numerator: i64, denominator: i64) -> Self {
        Self(self.0 * numerator / denominator)
    }

    /// Rounds to one decimal place, halves away from zero.
    #[must_use]
    pub const fn round_tenths(self) -> Self {
        let quotient = self.0 / UNITS_PER_TENTH;
        let remainder = self.0 % UNITS_PER_TENTH;
        let tenths = if remainder.abs() * 2 >= UNITS_PER_TENTH {
            quotient + remainder.signum()
        } else {
            quotient
        };
        Self(tenths * UNITS_PER_TENTH)
    }

    /// Converts to the nearest `f64`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / SCALE as f64
    }
}

impl Add for Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let scale = SCALE.unsigned_abs();
        let whole = abs / scale;
        let frac = abs % scale;
        if frac == 0 {
            return write!(f, "{sign}{whole}.0");
        }
        let digits = format!("{frac:04}");
        write!(f, "{sign}{whole}.{}", digits.trim_end_matches('0'))
    }
}
