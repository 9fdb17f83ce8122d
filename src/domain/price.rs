//! ETH-denominated asset prices.

use super::decimal::{ArithmeticError, Decimal};
use super::primitives::BaseUnits;
use serde::{Deserialize, Serialize};

/// Decimals of an oracle answer quoted in wei.
pub const WEI_DECIMALS: u8 = 18;

/// Value of one whole token expressed in ETH.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Price(Decimal);

impl Price {
    pub fn from_eth(eth: Decimal) -> Self {
        Price(eth)
    }

    /// Read an oracle answer expressed in wei per whole token.
    pub fn from_wei(wei: BaseUnits) -> Result<Self, ArithmeticError> {
        Decimal::from_base_units(wei, WEI_DECIMALS).map(Price)
    }

    pub fn eth(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ETH", self.0)
    }
}
