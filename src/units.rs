/// Amount conversion between human-entered decimals and on-chain base units
///
/// All arithmetic is exact (`num-bigint`); floating point is never used for
/// amounts. Rounding rule for `to_base_units`: round half up on the first
/// dropped fraction digit.
use crate::errors::{SwapError, SwapResult};
use num_bigint::BigUint;
use num_traits::{One, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// BASE UNIT AMOUNT
// =============================================================================

/// Integer amount in a token's smallest unit (wei for 18-decimal tokens)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BaseUnitAmount(BigUint);

impl BaseUnitAmount {
    pub fn new(value: BigUint) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    /// Minimal `0x` hex quantity as expected by JSON-RPC
    pub fn to_hex_quantity(&self) -> String {
        format!("{:#x}", self.0)
    }

    /// 32-byte big-endian word for ABI encoding; values above `uint256` fail
    pub fn to_abi_word(&self) -> SwapResult<[u8; 32]> {
        let bytes = self.0.to_bytes_be();
        if bytes.len() > 32 {
            return Err(SwapError::invalid_amount(
                self.0.to_string(),
                "does not fit in uint256",
            ));
        }
        let mut word = [0u8; 32];
        word[32 - bytes.len()..].copy_from_slice(&bytes);
        Ok(word)
    }
}

impl From<u64> for BaseUnitAmount {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl FromStr for BaseUnitAmount {
    type Err = SwapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SwapError::invalid_amount(
                s,
                "base-unit amount must be a non-negative integer",
            ));
        }
        BigUint::parse_bytes(trimmed.as_bytes(), 10)
            .map(Self)
            .ok_or_else(|| SwapError::invalid_amount(s, "unparseable integer"))
    }
}

impl fmt::Display for BaseUnitAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for BaseUnitAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for BaseUnitAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = crate::swaps::types::deserialize_string_or_number(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// DECIMAL AMOUNT
// =============================================================================

/// Exact non-negative decimal: `mantissa / 10^scale`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DecimalAmount {
    mantissa: BigUint,
    scale: u32,
}

impl DecimalAmount {
    pub fn new(mantissa: BigUint, scale: u32) -> Self {
        Self { mantissa, scale }
    }

    /// Parse a user-entered decimal string.
    ///
    /// Accepts `12`, `12.5`, `12.` and `.5` (surrounding whitespace ignored).
    pub fn parse(input: &str) -> SwapResult<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(SwapError::invalid_amount(input, "amount is empty"));
        }

        let (int_part, frac_part) = match trimmed.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (trimmed, ""),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(SwapError::invalid_amount(input, "no digits"));
        }
        if let Some(bad) = int_part
            .chars()
            .chain(frac_part.chars())
            .find(|c| !c.is_ascii_digit())
        {
            return Err(SwapError::invalid_amount(
                input,
                format!("unexpected character '{}'", bad),
            ));
        }

        let digits = format!("{}{}", int_part, frac_part);
        let mantissa = BigUint::parse_bytes(digits.as_bytes(), 10)
            .ok_or_else(|| SwapError::invalid_amount(input, "unparseable number"))?;

        Ok(Self {
            mantissa,
            scale: frac_part.len() as u32,
        })
    }

    pub fn zero() -> Self {
        Self::new(BigUint::zero(), 0)
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa.is_zero()
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// `numerator / denominator` rounded half up to `scale` fraction digits
    pub fn from_ratio(numerator: &BigUint, denominator: &BigUint, scale: u32) -> SwapResult<Self> {
        if denominator.is_zero() {
            return Err(SwapError::parse_error("division by zero in decimal ratio"));
        }
        let scaled = numerator * pow10(scale);
        let quotient = &scaled / denominator;
        let remainder = &scaled % denominator;
        let mantissa = if remainder * 2u32 >= *denominator {
            quotient + BigUint::one()
        } else {
            quotient
        };
        Ok(Self { mantissa, scale })
    }

    /// Exact product
    pub fn mul(&self, other: &DecimalAmount) -> DecimalAmount {
        DecimalAmount {
            mantissa: &self.mantissa * &other.mantissa,
            scale: self.scale + other.scale,
        }
    }

    /// Exact `self * (10000 - bps) / 10000`
    pub fn apply_bps_discount(&self, bps: u16) -> DecimalAmount {
        let keep = 10_000u32.saturating_sub(u32::from(bps));
        DecimalAmount {
            mantissa: &self.mantissa * BigUint::from(keep),
            scale: self.scale + 4,
        }
    }

    /// Round half up to `scale` fraction digits (no-op when already shorter)
    pub fn round_half_up(&self, scale: u32) -> DecimalAmount {
        if self.scale <= scale {
            return self.clone();
        }
        let drop = self.scale - scale;
        let divisor = pow10(drop);
        let quotient = &self.mantissa / &divisor;
        let remainder = &self.mantissa % &divisor;
        let mantissa = if remainder * 2u32 >= divisor {
            quotient + BigUint::one()
        } else {
            quotient
        };
        DecimalAmount { mantissa, scale }
    }

    /// Integer value at `decimals` precision, i.e. `round_half_up(self * 10^decimals)`
    pub fn to_base_units(&self, decimals: u8) -> BaseUnitAmount {
        let decimals = u32::from(decimals);
        let rounded = self.round_half_up(decimals);
        let mantissa = rounded.mantissa * pow10(decimals - rounded.scale);
        BaseUnitAmount(mantissa)
    }

    /// Render with exactly `scale` fraction digits, rounding half up
    pub fn to_fixed(&self, scale: u32) -> String {
        let rounded = self.round_half_up(scale);
        let padded = rounded.mantissa * pow10(scale - rounded.scale);
        render(&padded, scale, false)
    }
}

impl FromStr for DecimalAmount {
    type Err = SwapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DecimalAmount::parse(s)
    }
}

/// Normalized form: no trailing fraction zeros, no trailing dot
impl fmt::Display for DecimalAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", render(&self.mantissa, self.scale, true))
    }
}

fn pow10(exp: u32) -> BigUint {
    BigUint::from(10u32).pow(exp)
}

fn render(mantissa: &BigUint, scale: u32, trim: bool) -> String {
    let digits = mantissa.to_string();
    let scale = scale as usize;
    if scale == 0 {
        return digits;
    }

    let padded = if digits.len() <= scale {
        format!("{}{}", "0".repeat(scale - digits.len() + 1), digits)
    } else {
        digits
    };
    let (int_part, frac_part) = padded.split_at(padded.len() - scale);

    let frac_part = if trim {
        frac_part.trim_end_matches('0')
    } else {
        frac_part
    };

    if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{}.{}", int_part, frac_part)
    }
}

// =============================================================================
// CONVERSIONS
// =============================================================================

/// Convert a decimal string to base units for a token with `decimals` precision.
///
/// Extra fraction digits are rounded half up: `to_base_units("0.15", 1)` is `2`,
/// `to_base_units("0.14", 1)` is `1`.
pub fn to_base_units(amount: &str, decimals: u8) -> SwapResult<BaseUnitAmount> {
    Ok(DecimalAmount::parse(amount)?.to_base_units(decimals))
}

/// Convert base units back to a normalized decimal string
pub fn from_base_units(amount: &BaseUnitAmount, decimals: u8) -> String {
    DecimalAmount::new(amount.0.clone(), u32::from(decimals)).to_string()
}

/// Normalize a decimal or `0x` hex integer string into a minimal hex quantity.
///
/// Used for every numeric field handed to the signer. Signs, fractions and
/// empty values are rejected rather than coerced.
pub fn to_hex_quantity(raw: &str) -> SwapResult<String> {
    let trimmed = raw.trim();
    let value = if let Some(hex_digits) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        if hex_digits.is_empty() || !hex_digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(SwapError::parse_error(format!(
                "'{}' is not a hex quantity",
                raw
            )));
        }
        BigUint::parse_bytes(hex_digits.as_bytes(), 16)
    } else {
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SwapError::parse_error(format!(
                "'{}' is not a non-negative integer",
                raw
            )));
        }
        BigUint::parse_bytes(trimmed.as_bytes(), 10)
    };

    value
        .map(|v| format!("{:#x}", v))
        .ok_or_else(|| SwapError::parse_error(format!("'{}' could not be parsed", raw)))
}

/// Parse a hex quantity (`0x...`) into an integer
pub fn parse_hex_quantity(raw: &str) -> SwapResult<BigUint> {
    let digits = raw
        .trim()
        .strip_prefix("0x")
        .ok_or_else(|| SwapError::parse_error(format!("'{}' lacks 0x prefix", raw)))?;
    if digits.is_empty() {
        return Ok(BigUint::zero());
    }
    BigUint::parse_bytes(digits.as_bytes(), 16)
        .ok_or_else(|| SwapError::parse_error(format!("'{}' is not valid hex", raw)))
}
