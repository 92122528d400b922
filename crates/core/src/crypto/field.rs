//! Field elements and their canonical encoding
//!
//! Every commitment, nullifier and root handled by the ledger is an element of
//! the BN254 scalar field. Externally it is always written as lowercase,
//! `0x`-prefixed, 64-digit hex. Parsing accepts hex (with or without prefix),
//! decimal digit strings, raw big-endian bytes and the empty string (zero).

use std::fmt;
use std::str::FromStr;

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField, Zero};
use num_bigint::BigUint;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Width of the canonical hex form, in digits.
pub const CANONICAL_HEX_DIGITS: usize = 64;

/// Digits in the decimal modulus; anything longer is out of range.
const MAX_DECIMAL_DIGITS: usize = 77;

/// Longest slice of offending input echoed back in an error.
const PREVIEW_CHARS: usize = 80;

/// Leading text of every codec error message.
pub const CODEC_ERROR_PREFIX: &str = "invalid field element";

/// Errors raised while parsing a field element
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("invalid field element: unsupported characters in {0:?}")]
    InvalidCharacters(String),
    #[error("invalid field element: value {0} is not below the field modulus")]
    OutOfRange(String),
    #[error("invalid field element: expected at most 32 bytes, got {0}")]
    TooManyBytes(usize),
    #[error("invalid field element: invalid base58 address {0:?}")]
    InvalidAddress(String),
}

/// An element of the BN254 scalar field in canonical form
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FieldElement(Fr);

fn modulus() -> BigUint {
    Fr::MODULUS.into()
}

fn is_hex(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_hexdigit())
}

fn is_decimal(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn preview(s: &str) -> String {
    match s.char_indices().nth(PREVIEW_CHARS) {
        Some((end, _)) => format!("{}...", &s[..end]),
        None => s.to_string(),
    }
}

impl FieldElement {
    pub fn zero() -> Self {
        Self(Fr::zero())
    }

    pub fn from_u64(value: u64) -> Self {
        Self(Fr::from(value))
    }

    pub fn from_u128(value: u128) -> Self {
        Self(Fr::from(value))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Underlying arkworks field element
    pub fn inner(&self) -> Fr {
        self.0
    }

    /// Parse any accepted textual form into a field element.
    ///
    /// Resolution order: empty string, `0x` prefix, a bare 64-digit hex
    /// string, decimal digits, then bare hex. Values at or above the modulus
    /// are rejected rather than reduced.
    pub fn parse(input: &str) -> Result<Self, CodecError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(Self::zero());
        }

        let (digits, radix) = if let Some(rest) = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            if rest.is_empty() {
                return Ok(Self::zero());
            }
            if !is_hex(rest) {
                return Err(CodecError::InvalidCharacters(preview(input)));
            }
            (rest, 16)
        } else if trimmed.len() == CANONICAL_HEX_DIGITS && is_hex(trimmed) {
            (trimmed, 16)
        } else if is_decimal(trimmed) {
            (trimmed, 10)
        } else if is_hex(trimmed) {
            (trimmed, 16)
        } else {
            return Err(CodecError::InvalidCharacters(preview(input)));
        };

        let significant = digits.trim_start_matches('0');
        if significant.is_empty() {
            return Ok(Self::zero());
        }
        let max_digits = if radix == 16 {
            CANONICAL_HEX_DIGITS
        } else {
            MAX_DECIMAL_DIGITS
        };
        if significant.len() > max_digits {
            return Err(CodecError::OutOfRange(preview(significant)));
        }

        let value = BigUint::parse_bytes(significant.as_bytes(), radix)
            .ok_or_else(|| CodecError::InvalidCharacters(preview(input)))?;
        Self::from_biguint(&value)
    }

    /// Interpret raw big-endian bytes (at most 32) as a field element.
    pub fn from_bytes_be(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() > 32 {
            return Err(CodecError::TooManyBytes(bytes.len()));
        }
        Self::from_biguint(&BigUint::from_bytes_be(bytes))
    }

    /// Decode a base58 account address into a field element.
    pub fn from_base58_address(address: &str) -> Result<Self, CodecError> {
        let bytes = bs58::decode(address.trim())
            .into_vec()
            .map_err(|_| CodecError::InvalidAddress(preview(address)))?;
        if bytes.len() != 32 {
            return Err(CodecError::InvalidAddress(preview(address)));
        }
        Self::from_bytes_be(&bytes)
    }

    fn from_biguint(value: &BigUint) -> Result<Self, CodecError> {
        if value >= &modulus() {
            return Err(CodecError::OutOfRange(value.to_string()));
        }
        Ok(Self(Fr::from_be_bytes_mod_order(&value.to_bytes_be())))
    }

    /// Big-endian 32-byte representation
    pub fn to_bytes_be(&self) -> [u8; 32] {
        let bytes = self.0.into_bigint().to_bytes_be();
        let mut out = [0u8; 32];
        out[32 - bytes.len()..].copy_from_slice(&bytes);
        out
    }

    /// Canonical `0x` + 64 lowercase hex digits
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes_be()))
    }

    pub fn to_decimal(&self) -> String {
        BigUint::from_bytes_be(&self.to_bytes_be()).to_string()
    }
}

/// Canonicalize a textual field element.
pub fn to_canonical(input: &str) -> Result<String, CodecError> {
    FieldElement::parse(input).map(|fe| fe.to_hex())
}

impl From<Fr> for FieldElement {
    fn from(value: Fr) -> Self {
        Self(value)
    }
}

impl From<FieldElement> for Fr {
    fn from(value: FieldElement) -> Self {
        value.0
    }
}

impl FromStr for FieldElement {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({})", self.to_hex())
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

struct FieldElementVisitor;

impl<'de> Visitor<'de> for FieldElementVisitor {
    type Value = FieldElement;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a hex or decimal field element string, or an unsigned integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        FieldElement::parse(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(FieldElement::from_u64(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        u64::try_from(v)
            .map(FieldElement::from_u64)
            .map_err(|_| E::custom(format!("{}: negative value {}", CODEC_ERROR_PREFIX, v)))
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FieldElementVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_PADDED: &str = "0000000000000000000000000000000000000000000000000000000000000001";

    #[test]
    fn test_equivalent_forms_canonicalize_equal() {
        let a = FieldElement::parse(&format!("0x{ONE_PADDED}")).unwrap();
        let b = FieldElement::parse(ONE_PADDED).unwrap();
        let c = FieldElement::parse("1").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(c.to_hex(), format!("0x{ONE_PADDED}"));
    }

    #[test]
    fn test_canonicalization_idempotent() {
        for input in ["42", "0xff", "  0XAbC  ", "deadbeef", ONE_PADDED, ""] {
            let once = to_canonical(input).unwrap();
            let twice = to_canonical(&once).unwrap();
            assert_eq!(once, twice, "input {input:?}");
            assert_eq!(once.len(), 2 + CANONICAL_HEX_DIGITS);
            assert_eq!(once, once.to_lowercase());
        }
    }

    #[test]
    fn test_empty_and_bare_prefix_are_zero() {
        assert!(FieldElement::parse("").unwrap().is_zero());
        assert!(FieldElement::parse("0x").unwrap().is_zero());
        assert!(FieldElement::parse("   ").unwrap().is_zero());
    }

    #[test]
    fn test_decimal_preferred_over_hex_for_short_digits() {
        assert_eq!(FieldElement::parse("10").unwrap(), FieldElement::from_u64(10));
        assert_eq!(FieldElement::parse("0x10").unwrap(), FieldElement::from_u64(16));
        assert_eq!(FieldElement::parse("ff").unwrap(), FieldElement::from_u64(255));
    }

    #[test]
    fn test_rejects_invalid_characters() {
        assert!(matches!(
            FieldElement::parse("12g4"),
            Err(CodecError::InvalidCharacters(_))
        ));
        assert!(FieldElement::parse("0xzz").is_err());
        assert!(FieldElement::parse("-5").is_err());
    }

    #[test]
    fn test_rejects_values_at_modulus() {
        let modulus_str = modulus().to_string();
        assert!(matches!(
            FieldElement::parse(&modulus_str),
            Err(CodecError::OutOfRange(_))
        ));
        let below = (modulus() - 1u32).to_string();
        assert!(FieldElement::parse(&below).is_ok());
        let hex_modulus = format!("0x{}", modulus().to_str_radix(16));
        assert!(matches!(
            FieldElement::parse(&hex_modulus),
            Err(CodecError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_oversized_input_is_rejected_with_short_message() {
        let huge_hex = format!("0x{}", "f".repeat(400_000));
        let err = FieldElement::parse(&huge_hex).unwrap_err();
        assert!(matches!(err, CodecError::OutOfRange(_)));
        assert!(err.to_string().len() < 200);

        let huge_decimal = "9".repeat(400_000);
        let err = FieldElement::parse(&huge_decimal).unwrap_err();
        assert!(matches!(err, CodecError::OutOfRange(_)));
        assert!(err.to_string().len() < 200);

        let garbage = "z".repeat(400_000);
        let err = FieldElement::parse(&garbage).unwrap_err();
        assert!(matches!(err, CodecError::InvalidCharacters(_)));
        assert!(err.to_string().len() < 200);
    }

    #[test]
    fn test_leading_zeros_do_not_count_toward_width() {
        let padded = format!("0x{}1", "0".repeat(300));
        assert_eq!(FieldElement::parse(&padded).unwrap(), FieldElement::from_u64(1));
        let padded_decimal = format!("{}42", "0".repeat(300));
        assert_eq!(FieldElement::parse(&padded_decimal).unwrap(), FieldElement::from_u64(42));
    }

    #[test]
    fn test_errors_share_prefix() {
        for err in [
            FieldElement::parse("12g4").unwrap_err(),
            FieldElement::parse(&modulus().to_string()).unwrap_err(),
            FieldElement::from_bytes_be(&[0u8; 33]).unwrap_err(),
            FieldElement::from_base58_address("0OIl").unwrap_err(),
        ] {
            assert!(err.to_string().starts_with(CODEC_ERROR_PREFIX));
        }
    }

    #[test]
    fn test_bytes_roundtrip() {
        let fe = FieldElement::from_u64(0x0102_0304);
        let bytes = fe.to_bytes_be();
        assert_eq!(&bytes[28..], &[1, 2, 3, 4]);
        assert_eq!(FieldElement::from_bytes_be(&bytes).unwrap(), fe);
        assert!(FieldElement::from_bytes_be(&[0u8; 33]).is_err());
    }

    #[test]
    fn test_base58_address() {
        let mut raw = [0u8; 32];
        raw[31] = 7;
        let address = bs58::encode(raw).into_string();
        assert_eq!(
            FieldElement::from_base58_address(&address).unwrap(),
            FieldElement::from_u64(7)
        );
        assert!(FieldElement::from_base58_address("not-base58!").is_err());
    }

    #[test]
    fn test_serde_accepts_numbers_and_strings() {
        let from_num: FieldElement = serde_json::from_str("5").unwrap();
        let from_str: FieldElement = serde_json::from_str("\"0x05\"").unwrap();
        assert_eq!(from_num, from_str);
        let json = serde_json::to_string(&from_num).unwrap();
        assert_eq!(json, format!("\"{}\"", from_num.to_hex()));
    }
}
