use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{MerkleError, Result};

/// A canonical 20-byte Ethereum address.
///
/// Parsing folds case before decoding, so checksummed, lowercase and
/// uppercase spellings of the same account compare equal. `Display` renders
/// the lowercase `0x` form used as the proofs JSON key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(alloy_primitives::Address);

impl Address {
    pub const ZERO: Address = Address(alloy_primitives::Address::ZERO);

    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Address(alloy_primitives::Address::new(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }

    /// Parses an Ethereum address from a hex string.
    ///
    /// # Arguments
    /// * `addr_str` - The address string, with or without "0x" prefix, any case
    ///
    /// # Errors
    /// Returns `MerkleError::InvalidAddress` if the address is not 40 hex
    /// characters or contains invalid hex
    pub fn parse(addr_str: &str) -> Result<Self> {
        let trimmed = addr_str.trim();
        let cleaned = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if cleaned.len() != 40 {
            return Err(MerkleError::invalid_address(
                addr_str,
                format!("expected 40 hex chars, got {}", cleaned.len()),
            ));
        }
        cleaned
            .parse::<alloy_primitives::Address>()
            .map(Address)
            .map_err(|e| MerkleError::invalid_address(addr_str, e.to_string()))
    }

    /// Renders the EIP-55 mixed-case checksum form.
    pub fn to_checksum(&self) -> String {
        self.0.to_checksum(None)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0.as_slice()))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl FromStr for Address {
    type Err = MerkleError;

    fn from_str(s: &str) -> Result<Self> {
        Address::parse(s)
    }
}

impl From<alloy_primitives::Address> for Address {
    fn from(address: alloy_primitives::Address) -> Self {
        Address(address)
    }
}

impl From<Address> for alloy_primitives::Address {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address_with_prefix() {
        let addr = Address::parse("0x1234567890abcdef1234567890abcdef12345678").unwrap();
        assert_eq!(addr.as_bytes()[0], 0x12);
        assert_eq!(addr.as_bytes()[19], 0x78);
    }

    #[test]
    fn test_parse_address_without_prefix() {
        let with = Address::parse("0x1234567890abcdef1234567890abcdef12345678").unwrap();
        let without = Address::parse("1234567890abcdef1234567890abcdef12345678").unwrap();
        assert_eq!(with, without);
    }

    #[test]
    fn test_parse_address_folds_case() {
        let mixed = Address::parse("0x057aFd2552c7F03B3A7dD58993aae61a3278b53D").unwrap();
        let lower = Address::parse("0x057afd2552c7f03b3a7dd58993aae61a3278b53d").unwrap();
        let upper = Address::parse("0x057AFD2552C7F03B3A7DD58993AAE61A3278B53D").unwrap();
        assert_eq!(mixed, lower);
        assert_eq!(mixed, upper);
        assert_eq!(mixed.to_string(), "0x057afd2552c7f03b3a7dd58993aae61a3278b53d");
    }

    #[test]
    fn test_parse_address_trims_whitespace() {
        let addr = Address::parse("  0x1234567890abcdef1234567890abcdef12345678\n").unwrap();
        assert_eq!(addr.to_string(), "0x1234567890abcdef1234567890abcdef12345678");
    }

    #[test]
    fn test_parse_address_invalid_length() {
        let short = "0x".to_string() + &"a".repeat(39);
        assert!(matches!(
            Address::parse(&short),
            Err(MerkleError::InvalidAddress { .. })
        ));
        assert!(Address::parse("0x1234").is_err());
        assert!(Address::parse("").is_err());
    }

    #[test]
    fn test_parse_address_invalid_hex() {
        let result = Address::parse("0xghijklmnopqrstuvwxyz1234567890abcdef1234");
        assert!(matches!(result, Err(MerkleError::InvalidAddress { .. })));
    }

    #[test]
    fn test_zero_address_is_well_formed() {
        let zero = Address::parse(&format!("0x{}", "0".repeat(40))).unwrap();
        assert_eq!(zero, Address::ZERO);
    }

    #[test]
    fn test_checksum_eip55_vectors() {
        for expected in [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
        ] {
            let addr = Address::parse(expected).unwrap();
            assert_eq!(addr.to_checksum(), expected);
        }
    }

    #[test]
    fn test_serde_uses_lowercase_form() {
        let addr = Address::parse("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed\"");
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
