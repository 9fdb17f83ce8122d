pub mod api;
pub mod config;
pub mod datasource;
pub mod domain;
pub mod engine;
pub mod error;
pub mod market;
pub mod oracle;
pub mod orchestration;

pub use config::Config;
pub use datasource::{
    CollaboratorError, HttpLendingGateway, LendingPool, MockMarket, PoolStateReader, PriceOracle,
    SwapQuoter,
};
pub use domain::{Address, Asset, BaseUnits, Decimal, Price, RejectionReason, Symbol};
pub use engine::{PositionSizer, SwapBundle, SwapPath, SwapRoute, WithdrawalSizer};
pub use error::AppError;
pub use market::{MarketContext, MarketContextBuilder, MarketSpec};
pub use oracle::{OracleAdapter, PriceSnapshot};
pub use orchestration::{LeveragePlanner, PlannerSettings};
