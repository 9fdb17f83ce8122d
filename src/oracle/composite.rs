//! Composite (LP token) pricing.
//!
//! An LP token is worth the ETH value of everything its pool holds divided by
//! the LP supply. Constituents can be LP tokens themselves (a meta pool
//! holding a base pool's LP), which the adapter resolves recursively up to
//! [`MAX_COMPOSITE_DEPTH`] levels.

use super::OracleError;
use crate::domain::{Asset, BaseUnits, Decimal, Price};
use serde::{Deserialize, Serialize};

/// Composite levels resolved before giving up: an LP, its LP constituent,
/// and that constituent's LP constituent.
pub const MAX_COMPOSITE_DEPTH: usize = 3;

/// ETH prices are kept at wei precision.
const PRICE_SCALE: u32 = 18;

/// Static topology of an LP token: which assets its pool holds, in pool order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeDefinition {
    pub lp_token: Asset,
    pub constituents: Vec<Asset>,
}

/// Live pool state, read fresh for each pricing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolComposition {
    pub total_supply: BaseUnits,
    /// Balances in the same order as [`CompositeDefinition::constituents`].
    pub balances: Vec<BaseUnits>,
}

/// `Σ(price_i × balance_i) / total_supply`, floored at wei precision.
pub fn composite_price(
    definition: &CompositeDefinition,
    composition: &PoolComposition,
    constituent_prices: &[Price],
) -> Result<Price, OracleError> {
    let expected = definition.constituents.len();
    for got in [composition.balances.len(), constituent_prices.len()] {
        if got != expected {
            return Err(OracleError::CompositionMismatch {
                asset: definition.lp_token.symbol.clone(),
                expected,
                got,
            });
        }
    }

    let mut pool_value = Decimal::zero();
    for ((asset, balance), price) in definition
        .constituents
        .iter()
        .zip(&composition.balances)
        .zip(constituent_prices)
    {
        let amount = Decimal::from_base_units(*balance, asset.decimals)?;
        pool_value = pool_value.checked_add(amount.mul_floor(price.eth())?)?;
    }

    let supply = Decimal::from_base_units(composition.total_supply, definition.lp_token.decimals)?;
    let price = pool_value.div_floor(supply, PRICE_SCALE)?;
    Ok(Price::from_eth(price))
}
