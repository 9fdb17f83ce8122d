//! Price oracle adapter and consistent price snapshots.

use crate::datasource::CollaboratorError;
use crate::domain::{Address, ArithmeticError, Asset, Price, Symbol};
use std::collections::HashMap;
use thiserror::Error;

pub mod adapter;
pub mod composite;

pub use adapter::OracleAdapter;
pub use composite::{CompositeDefinition, PoolComposition, MAX_COMPOSITE_DEPTH};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OracleError {
    #[error("asset {0} is not priced by the oracle")]
    AssetNotPriced(Asset),
    #[error("composite price of {asset} nests deeper than {max} levels")]
    CompositeTooDeep { asset: Symbol, max: usize },
    #[error("pool composition of {asset} reports {got} balances for {expected} constituents")]
    CompositionMismatch {
        asset: Symbol,
        expected: usize,
        got: usize,
    },
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

/// Prices for every asset one logical action touches, read up front.
///
/// Sizing arithmetic only ever reads from a snapshot, so a single action can
/// never mix prices from different oracle reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSnapshot {
    prices: HashMap<Address, (Asset, Price)>,
}

impl PriceSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, asset: &Asset, price: Price) -> Self {
        self.insert(asset, price);
        self
    }

    pub fn insert(&mut self, asset: &Asset, price: Price) {
        self.prices
            .insert(asset.address.clone(), (asset.clone(), price));
    }

    pub fn price_of(&self, asset: &Asset) -> Result<Price, OracleError> {
        self.prices
            .get(&asset.address)
            .map(|(_, price)| *price)
            .ok_or_else(|| OracleError::AssetNotPriced(asset.clone()))
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}
