//! In-memory lending market for tests without network calls.

use super::{CollaboratorError, LendingPool, PoolStateReader, PriceOracle, SwapQuoter};
use crate::domain::{
    Address, Asset, BaseUnits, PositionSnapshot, Price, RejectionReason, ReserveConfiguration,
};
use crate::engine::SwapPath;
use crate::oracle::PoolComposition;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

/// Mock collaborator implementing every external interface from predefined data.
#[derive(Debug, Clone, Default)]
pub struct MockMarket {
    prices: HashMap<Address, Price>,
    reserves: HashMap<Address, ReserveConfiguration>,
    accounts: HashMap<Address, PositionSnapshot>,
    compositions: HashMap<Address, PoolComposition>,
    /// `None` lets everyone through.
    whitelist: Option<HashSet<Address>>,
    quote: Option<BaseUnits>,
    outage: bool,
}

impl MockMarket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, asset: &Asset, price: Price) -> Self {
        self.prices.insert(asset.address.clone(), price);
        self
    }

    pub fn with_reserve(mut self, asset: &Asset, config: ReserveConfiguration) -> Self {
        self.reserves.insert(asset.address.clone(), config);
        self
    }

    pub fn with_account(mut self, user: &Address, snapshot: PositionSnapshot) -> Self {
        self.accounts.insert(user.clone(), snapshot);
        self
    }

    pub fn with_composition(mut self, lp_token: &Asset, composition: PoolComposition) -> Self {
        self.compositions
            .insert(lp_token.address.clone(), composition);
        self
    }

    /// Restrict leverage access to whitelisted users.
    pub fn with_whitelisted(mut self, user: &Address) -> Self {
        self.whitelist
            .get_or_insert_with(HashSet::new)
            .insert(user.clone());
        self
    }

    /// Every quote returns this amount.
    pub fn with_quote(mut self, amount_out: BaseUnits) -> Self {
        self.quote = Some(amount_out);
        self
    }

    /// Every call fails with a network error.
    pub fn with_outage(mut self) -> Self {
        self.outage = true;
        self
    }

    fn ensure_online(&self) -> Result<(), CollaboratorError> {
        if self.outage {
            return Err(CollaboratorError::NetworkError(
                "mock market unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl PriceOracle for MockMarket {
    async fn get_asset_price(&self, asset: &Asset) -> Result<Price, CollaboratorError> {
        self.ensure_online()?;
        self.prices
            .get(&asset.address)
            .copied()
            .ok_or_else(|| CollaboratorError::NotPriced(asset.symbol.clone()))
    }
}

#[async_trait]
impl LendingPool for MockMarket {
    async fn get_user_account_data(
        &self,
        user: &Address,
    ) -> Result<PositionSnapshot, CollaboratorError> {
        self.ensure_online()?;
        self.accounts
            .get(user)
            .cloned()
            .ok_or_else(|| CollaboratorError::Other(format!("no account data for {}", user)))
    }

    async fn get_reserve_configuration_data(
        &self,
        asset: &Asset,
    ) -> Result<ReserveConfiguration, CollaboratorError> {
        self.ensure_online()?;
        self.reserves
            .get(&asset.address)
            .copied()
            .ok_or(CollaboratorError::Rejected(RejectionReason::InvalidReserve))
    }

    async fn check_leverage_access(
        &self,
        user: &Address,
        _collateral: &Asset,
    ) -> Result<(), CollaboratorError> {
        self.ensure_online()?;
        match &self.whitelist {
            Some(allowed) if !allowed.contains(user) => Err(CollaboratorError::Rejected(
                RejectionReason::NotWhitelisted,
            )),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl PoolStateReader for MockMarket {
    async fn get_pool_composition(
        &self,
        lp_token: &Asset,
        _constituents: &[Asset],
    ) -> Result<PoolComposition, CollaboratorError> {
        self.ensure_online()?;
        self.compositions
            .get(&lp_token.address)
            .cloned()
            .ok_or_else(|| CollaboratorError::Other(format!("no pool state for {}", lp_token)))
    }
}

#[async_trait]
impl SwapQuoter for MockMarket {
    async fn quote(&self, _path: &SwapPath) -> Result<BaseUnits, CollaboratorError> {
        self.ensure_online()?;
        self.quote
            .ok_or_else(|| CollaboratorError::Other("no quote configured".to_string()))
    }
}
