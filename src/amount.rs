use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

/// Exact base-10 monetary amount.
///
/// Wraps a 96-bit `Decimal` so that sums of parsed amounts never drift the way
/// binary floats do. Amounts are signed: balances use the sign to tell debtors
/// from creditors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// Smallest amount considered significant (one currency minor unit).
    pub const EPSILON: Amount = Amount(Decimal::from_parts(1, 0, 0, false, 2));

    pub fn new(value: Decimal) -> Self {
        Amount(value)
    }

    /// Build an amount from an integer count of minor units (cents).
    pub fn from_cents(cents: i64) -> Self {
        Amount(Decimal::new(cents, 2))
    }

    pub fn into_inner(self) -> Decimal {
        self.0
    }

    pub fn abs(self) -> Self {
        Amount(self.0.abs())
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// True when the amount lies within [`Amount::EPSILON`] of zero.
    pub fn is_negligible(self) -> bool {
        self.abs() <= Self::EPSILON
    }

    /// Exact sum, or `None` when it does not fit in a `Decimal`.
    ///
    /// A sum that would have to round away decimal places counts as not
    /// fitting.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        let sum = self.0.checked_add(rhs.0)?;
        exact(sum, self, rhs)
    }

    /// Exact difference, or `None` when it does not fit in a `Decimal`.
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        let difference = self.0.checked_sub(rhs.0)?;
        exact(difference, self, rhs)
    }
}

// `Decimal` keeps the larger operand scale unless it had to round.
fn exact(result: Decimal, lhs: Amount, rhs: Amount) -> Option<Amount> {
    (result.scale() >= lhs.0.scale().max(rhs.0.scale())).then_some(Amount(result))
}

/// Error returned when an amount's text is not a base-10 decimal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid amount '{0}'")]
pub struct ParseAmountError(pub String);

impl FromStr for Amount {
    type Err = ParseAmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        // `from_str_exact` rejects values that would lose digits instead of rounding them.
        Decimal::from_str_exact(trimmed)
            .map(Amount)
            .map_err(|_| ParseAmountError(trimmed.to_string()))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

/// Serialized as a JSON number carrying every digit of the amount.
impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::arbitrary_precision::serialize(&self.0.normalize(), serializer)
    }
}

impl std::ops::Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Amount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Amount(self.0 - rhs.0)
    }
}

impl std::ops::Neg for Amount {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Amount(-self.0)
    }
}

impl std::ops::AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::ops::SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl std::iter::Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |acc, amount| acc + amount)
    }
}
