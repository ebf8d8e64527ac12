/// Shared swap data types: quotes, rates, transaction descriptors
use crate::tokens::Token;
use crate::units::{BaseUnitAmount, DecimalAmount};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Accept a JSON string or number and keep its textual form.
///
/// The aggregator returns amounts and gas figures as strings in one endpoint
/// and as numbers in another. A number that only fits an `f64` (a fraction,
/// or an integer above `u64::MAX`) keeps its exponent form, which the integer
/// parsers downstream reject instead of using a rounded value.
pub fn deserialize_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct StringOrNumber;

    impl<'de> Visitor<'de> for StringOrNumber {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or number")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<String, E> {
            Ok(value.to_owned())
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<String, E> {
            Ok(format!("{:e}", value))
        }
    }

    deserializer.deserialize_any(StringOrNumber)
}

/// Optional variant of [`deserialize_string_or_number`]; `null` or a missing
/// field yields `None`
pub fn deserialize_optional_string_or_number<'de, D>(
    deserializer: D,
) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "deserialize_string_or_number")] String);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|Wrapper(value)| value))
}

// =============================================================================
// QUOTE
// =============================================================================

/// A priced route for one (source, destination, amount) triple.
///
/// Immutable; a newer quote replaces it rather than updating it.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub router_id: String,
    pub source: Token,
    pub destination: Token,
    pub source_amount: BaseUnitAmount,
    pub destination_amount: BaseUnitAmount,
    /// Token-transfer proxy that must be approved to move the source token
    pub spender: Option<String>,
    /// Raw price route, handed back verbatim to the build endpoint
    pub route: serde_json::Value,
    pub fetched_at: DateTime<Utc>,
}

/// Destination per source unit, adjusted for both tokens' decimals and
/// rounded half up to a fixed number of fraction digits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveRate {
    value: DecimalAmount,
    display_decimals: u32,
}

impl EffectiveRate {
    pub fn new(value: DecimalAmount, display_decimals: u32) -> Self {
        Self {
            value,
            display_decimals,
        }
    }

    pub fn value(&self) -> &DecimalAmount {
        &self.value
    }
}

/// Always shows `display_decimals` digits, e.g. `2.00000`
impl fmt::Display for EffectiveRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value.to_fixed(self.display_decimals))
    }
}

/// Identity of a quote request: which pair and which typed amount
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuoteFingerprint {
    source: String,
    destination: String,
    amount: String,
}

impl QuoteFingerprint {
    pub fn new(source: &str, destination: &str, amount: &str) -> Self {
        Self {
            source: source.trim().to_lowercase(),
            destination: destination.trim().to_lowercase(),
            amount: amount.trim().to_string(),
        }
    }
}

// =============================================================================
// TRANSACTIONS
// =============================================================================

/// Transaction parameters as returned by the build endpoint, before any
/// normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub from: String,
    pub to: String,
    #[serde(deserialize_with = "deserialize_string_or_number")]
    pub value: String,
    pub data: String,
    #[serde(
        rename = "gasPrice",
        default,
        deserialize_with = "deserialize_optional_string_or_number"
    )]
    pub gas_price: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string_or_number")]
    pub gas: Option<String>,
    #[serde(rename = "chainId", deserialize_with = "deserialize_string_or_number")]
    pub chain_id: String,
}

/// A transaction ready for `eth_sendTransaction`.
///
/// Every numeric field is a minimal `0x` hex quantity. Absent gas fields are
/// left to the signer to estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDescriptor {
    pub from: String,
    pub to: String,
    pub data: String,
    pub value: String,
    #[serde(rename = "gas", skip_serializing_if = "Option::is_none", default)]
    pub gas_limit: Option<String>,
    #[serde(rename = "gasPrice", skip_serializing_if = "Option::is_none", default)]
    pub gas_price: Option<String>,
    #[serde(rename = "chainId")]
    pub chain_id: String,
}

/// Hash returned by the signer for a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub String);

impl TransactionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
