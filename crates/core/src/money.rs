use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    pub fn from_decimal(decimal: Decimal) -> Self {
        Money(decimal.round_dp(2))
    }

    pub fn from_major(units: i64) -> Self {
        Money(Decimal::from(units))
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn abs(self) -> Self {
        Money(self.0.abs())
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    /// Symmetric percentage difference against the average of the two
    /// amounts, entirely in decimal arithmetic. `None` when the average is
    /// zero (e.g. amounts that cancel), which callers treat as incomparable.
    pub fn pct_difference(self, other: Money) -> Option<Decimal> {
        let avg = (self.0 + other.0) / Decimal::TWO;
        if avg.is_zero() {
            return None;
        }
        Some(((self.0 - other.0).abs() / avg.abs()) * Decimal::ONE_HUNDRED)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Money(self.0 - rhs.0)
    }
}
