//! Deserialization of money amounts from request bodies and query strings.
//!
//! JSON numbers pass through `f64` and keep about 15 significant digits. A
//! string such as `"1234567890.123456789"` is parsed directly and kept exact.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, de};

#[derive(Deserialize)]
#[serde(untagged)]
enum Amount {
    Exact(String),
    Number(Decimal),
}

impl Amount {
    fn into_decimal<E: de::Error>(self) -> Result<Decimal, E> {
        match self {
            Amount::Exact(text) => Decimal::from_str_exact(text.trim())
                .map_err(|error| E::custom(format!("invalid amount {text:?}: {error}"))),
            Amount::Number(amount) => Ok(amount),
        }
    }
}

/// Deserialize an amount given as either a number or a decimal string.
pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    Amount::deserialize(deserializer)?.into_decimal()
}

/// Like [deserialize], for optional amounts.
pub(crate) fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Amount>::deserialize(deserializer)?
        .map(Amount::into_decimal)
        .transpose()
}
