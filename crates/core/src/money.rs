//! Currency amounts with two-decimal semantics.

use core::iter::Sum;
use core::ops::Add;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DomainError;

/// A non-negative price, stored in the smallest currency unit (cents).
///
/// On the wire a price is a plain decimal number (`40`, `25.99`), which is what
/// the product endpoint emits and what persisted carts contain.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Price(u64);

impl Price {
    pub const ZERO: Price = Price(0);

    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Convert a decimal amount, rounding to the nearest cent.
    pub fn from_decimal(amount: f64) -> Result<Self, DomainError> {
        if !amount.is_finite() {
            return Err(DomainError::validation("price must be a finite number"));
        }
        if amount < 0.0 {
            return Err(DomainError::validation(format!(
                "price cannot be negative (got {amount})"
            )));
        }
        let cents = (amount * 100.0).round();
        if cents >= u64::MAX as f64 {
            return Err(DomainError::validation("price is out of range"));
        }
        Ok(Self(cents as u64))
    }

    pub const fn cents(self) -> u64 {
        self.0
    }

    pub fn as_decimal(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// `self - other`, or `None` when the result would go below zero.
    pub fn checked_sub(self, other: Price) -> Option<Price> {
        self.0.checked_sub(other.0).map(Price)
    }
}

impl core::fmt::Display for Price {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Add for Price {
    type Output = Price;

    fn add(self, rhs: Price) -> Price {
        Price(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Price>>(iter: I) -> Price {
        iter.fold(Price::ZERO, Add::add)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_decimal())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = f64::deserialize(deserializer)?;
        Price::from_decimal(amount).map_err(serde::de::Error::custom)
    }
}
