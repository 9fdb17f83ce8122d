//! Collaborator abstractions for the external lending system: price oracle,
//! lending pool, pool state and swap quoting.

use crate::domain::{
    Address, Asset, BaseUnits, PositionSnapshot, Price, RejectionReason, ReserveConfiguration,
    Symbol,
};
use crate::engine::SwapPath;
use crate::oracle::PoolComposition;
use async_trait::async_trait;
use std::fmt;

pub mod http;
pub mod mock;

pub use http::HttpLendingGateway;
pub use mock::MockMarket;

/// Asset price lookups, ETH-denominated.
#[async_trait]
pub trait PriceOracle: Send + Sync + fmt::Debug {
    /// Price of one whole token of `asset`.
    ///
    /// Returns `CollaboratorError::NotPriced` when the asset is not listed.
    async fn get_asset_price(&self, asset: &Asset) -> Result<Price, CollaboratorError>;
}

/// Read side of the lending pool, plus its leverage access gate.
#[async_trait]
pub trait LendingPool: Send + Sync + fmt::Debug {
    async fn get_user_account_data(
        &self,
        user: &Address,
    ) -> Result<PositionSnapshot, CollaboratorError>;

    async fn get_reserve_configuration_data(
        &self,
        asset: &Asset,
    ) -> Result<ReserveConfiguration, CollaboratorError>;

    /// Fails with `Rejected(NotWhitelisted)` when `user` may not open or
    /// close leveraged positions on `collateral`.
    async fn check_leverage_access(
        &self,
        user: &Address,
        collateral: &Asset,
    ) -> Result<(), CollaboratorError>;
}

/// Live balances of liquidity pools backing LP tokens.
#[async_trait]
pub trait PoolStateReader: Send + Sync + fmt::Debug {
    /// Balances are returned in the order of `constituents`.
    async fn get_pool_composition(
        &self,
        lp_token: &Asset,
        constituents: &[Asset],
    ) -> Result<PoolComposition, CollaboratorError>;
}

/// Optional pool simulation used to tighten min-out bounds.
#[async_trait]
pub trait SwapQuoter: Send + Sync + fmt::Debug {
    /// Simulated output of `path`, in base units of `path.swap_to`.
    async fn quote(&self, path: &SwapPath) -> Result<BaseUnits, CollaboratorError>;
}

/// Error type for collaborator calls.
#[derive(Debug, Clone, PartialEq)]
pub enum CollaboratorError {
    /// Network error (e.g., connection timeout, DNS failure)
    NetworkError(String),
    /// HTTP error (e.g., 429 rate limit, 5xx server error)
    HttpError { status: u16, message: String },
    /// Parsing error (invalid JSON or malformed response)
    ParseError(String),
    /// Rate limit exceeded
    RateLimited,
    /// Asset is not listed by the oracle
    NotPriced(Symbol),
    /// The external system reverted with a known reason code
    Rejected(RejectionReason),
    /// Other error
    Other(String),
}

impl fmt::Display for CollaboratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollaboratorError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            CollaboratorError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            CollaboratorError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            CollaboratorError::RateLimited => write!(f, "Rate limited"),
            CollaboratorError::NotPriced(symbol) => write!(f, "Asset not priced: {}", symbol),
            CollaboratorError::Rejected(reason) => write!(f, "Rejected: {}", reason),
            CollaboratorError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for CollaboratorError {}
