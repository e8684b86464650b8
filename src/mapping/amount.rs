use std::{fmt, ops::Neg, str::FromStr};

use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::{Serialize, Serializer};
use serde_json::Value;

/// A monetary amount or quantity taken from a unified record.
///
/// Arithmetic is done in decimal so that sums such as a journal entry's
/// balance are exact. Addition and multiplication are checked and report
/// overflow as `None`. When serialized, whole values are emitted as JSON
/// integers and everything else as a JSON float.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, PartialOrd, Ord)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);
    pub const ONE: Amount = Amount(Decimal::ONE);

    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Parse an amount from a JSON value. Both numbers and numeric strings are
    /// accepted since upstream schemas are inconsistent about which they send.
    ///
    /// # Returns
    ///
    /// `None` if the value is neither a number nor a parseable string.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => parse_decimal(&number.to_string()),
            Value::String(raw) => parse_decimal(raw.trim()),
            _ => None,
        }
        .map(Self)
    }

    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// `None` on overflow.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// `None` on overflow.
    pub fn checked_mul(self, rhs: Self) -> Option<Self> {
        self.0.checked_mul(rhs.0).map(Self)
    }

    /// Sum amounts, or `None` if any partial sum overflows.
    pub fn checked_sum<I: IntoIterator<Item = Self>>(amounts: I) -> Option<Self> {
        amounts
            .into_iter()
            .try_fold(Self::ZERO, |sum, amount| sum.checked_add(amount))
    }
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Self(Decimal::from(value))
    }
}

impl Neg for Amount {
    type Output = Amount;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.fract().is_zero() {
            if let Some(whole) = self.0.to_i64() {
                return serializer.serialize_i64(whole);
            }
        }

        // Parsing the decimal text gives the closest float, which `to_f64`
        // does not guarantee.
        let text = self.0.normalize().to_string();
        match text.parse::<f64>() {
            Ok(float) => serializer.serialize_f64(float),
            Err(_) => serializer.serialize_str(&text),
        }
    }
}
