use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;
use thiserror::Error;

/// The single currency all summaries are normalized into.
pub const REPORTING_CURRENCY: &str = "CHF";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("amount is empty")]
    Empty,
    #[error("invalid amount {0:?}")]
    Invalid(String),
    #[error("amount {0:?} is out of range")]
    OutOfRange(String),
}

/// A fixed-point amount with two decimal places.
///
/// The canonical text form is a plain signed decimal (`-1500.00`, `12.34`);
/// the storage form is integer minor units (cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    /// Saturates at the `i64` bounds; values built through [`Money::parse`] are always in range.
    pub fn to_cents(self) -> i64 {
        let saturated = if self.0.is_sign_negative() {
            i64::MIN
        } else {
            i64::MAX
        };
        self.0
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.trunc().to_i64())
            .unwrap_or(saturated)
    }

    /// Rounds half away from zero to two places.
    pub fn from_decimal(decimal: Decimal) -> Self {
        Money(decimal.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }

    pub fn parse(text: &str) -> Result<Self, MoneyError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(MoneyError::Empty);
        }
        let decimal =
            Decimal::from_str(text).map_err(|_| MoneyError::Invalid(text.to_string()))?;
        let money = Money::from_decimal(decimal);
        money
            .0
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.to_i64())
            .ok_or_else(|| MoneyError::OutOfRange(text.to_string()))?;
        Ok(money)
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::parse(s)
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

impl Neg for Money {
    type Output = Self;
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::zero(), |a, b| a + b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parse_plain_and_signed() {
        assert_eq!(Money::parse("-1500.00").unwrap().to_cents(), -150_000);
        assert_eq!(Money::parse("12.34").unwrap().to_cents(), 1234);
        assert_eq!(Money::parse("  7 ").unwrap().to_cents(), 700);
    }

    #[test]
    fn parse_rounds_to_two_places() {
        assert_eq!(Money::parse("1.005").unwrap().to_cents(), 101);
        assert_eq!(Money::parse("-1.005").unwrap().to_cents(), -101);
        assert_eq!(Money::parse("0.004").unwrap().to_cents(), 0);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(Money::parse(""), Err(MoneyError::Empty));
        assert_eq!(Money::parse("   "), Err(MoneyError::Empty));
        assert!(matches!(Money::parse("12,34"), Err(MoneyError::Invalid(_))));
        assert!(matches!(Money::parse("1'500.00"), Err(MoneyError::Invalid(_))));
        assert!(matches!(
            Money::parse("99999999999999999999999"),
            Err(MoneyError::OutOfRange(_))
        ));
    }

    #[test]
    fn parse_rejects_amounts_beyond_cent_range_without_panicking() {
        for text in ["10000000000000000000000000000", "-10000000000000000000000000000"] {
            assert_eq!(Money::parse(text), Err(MoneyError::OutOfRange(text.to_string())));
        }
        assert!(matches!(
            Money::parse("-79228162514264337593543950335"),
            Err(MoneyError::OutOfRange(_))
        ));
    }

    #[test]
    fn to_cents_saturates_instead_of_overflowing() {
        let huge = Money::from_decimal(dec!(10000000000000000000000000000));
        assert_eq!(huge.to_cents(), i64::MAX);
        assert_eq!((-huge).to_cents(), i64::MIN);
    }

    #[test]
    fn cents_round_trip_through_text() {
        let money = Money::from_cents(-590);
        assert_eq!(money.to_string(), "-5.90");
        assert_eq!(Money::parse(&money.to_string()).unwrap(), money);
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
    }

    #[test]
    fn from_decimal_rounds_half_away_from_zero() {
        assert_eq!(Money::from_decimal(dec!(2.345)).to_cents(), 235);
        assert_eq!(Money::from_decimal(dec!(-2.345)).to_cents(), -235);
    }

    #[test]
    fn sign_helpers() {
        assert!(Money::from_cents(-1).is_negative());
        assert!(!Money::zero().is_negative());
        assert!(Money::zero().is_zero());
        assert_eq!(-Money::from_cents(100), Money::from_cents(-100));
    }

    #[test]
    fn sum_of_amounts() {
        let total: Money = [100, -250, 75].into_iter().map(Money::from_cents).sum();
        assert_eq!(total.to_cents(), -75);
    }
}
