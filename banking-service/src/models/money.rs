//! Monetary amounts on the wire.
//!
//! Domain code works in `rust_decimal::Decimal`. Documents store amounts as
//! integer minor units (cents) so `$sum` aggregation pipelines stay numeric;
//! BSON has no native decimal mapping for `Decimal`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Convert a decimal amount to integer minor units, rounding to two places.
/// Returns `None` when the amount does not fit an `i64`.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    (amount * Decimal::ONE_HUNDRED).round().to_i64()
}

/// Convert integer minor units back to a decimal amount.
pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

/// Serde adapter: `Decimal` <-> i64 minor units.
pub mod as_minor_units {
    use super::*;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(amount: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let minor = to_minor_units(*amount)
            .ok_or_else(|| serde::ser::Error::custom("amount out of range for minor units"))?;
        serializer.serialize_i64(minor)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let minor = i64::deserialize(deserializer)?;
        Ok(from_minor_units(minor))
    }
}
