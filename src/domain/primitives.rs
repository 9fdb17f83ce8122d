//! Domain primitives: Address, Symbol, Asset, BaseUnits.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

/// On-chain address (hex string), compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub String);

impl Address {
    /// Create an Address, normalising to lowercase.
    pub fn new(addr: String) -> Self {
        Address(addr.to_ascii_lowercase())
    }

    /// The zero address used by placeholder hops.
    pub fn zero() -> Self {
        Address(format!("0x{}", "0".repeat(40)))
    }

    pub fn is_zero(&self) -> bool {
        self.0.trim_start_matches("0x").chars().all(|c| c == '0')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pools are addressed like any other contract.
pub type PoolId = Address;

/// Token symbol (e.g., "USDC", "TUSDFRAXBP").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl Symbol {
    pub fn new(symbol: String) -> Self {
        Symbol(symbol)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A fungible token with a fixed decimal precision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    pub address: Address,
    pub symbol: Symbol,
    pub decimals: u8,
}

impl Asset {
    pub fn new(address: Address, symbol: Symbol, decimals: u8) -> Self {
        Self {
            address,
            symbol,
            decimals,
        }
    }
}

impl std::fmt::Display for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.symbol, self.address)
    }
}

/// Integer amount in an asset's smallest unit.
///
/// Serialized as a decimal string; JSON numbers cannot carry 18-decimal
/// amounts without loss.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BaseUnits(u128);

impl BaseUnits {
    pub fn new(value: u128) -> Self {
        BaseUnits(value)
    }

    pub fn zero() -> Self {
        BaseUnits(0)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn as_u128(&self) -> u128 {
        self.0
    }
}

impl std::fmt::Display for BaseUnits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BaseUnits {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u128>().map(BaseUnits)
    }
}

impl Serialize for BaseUnits {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for BaseUnits {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
