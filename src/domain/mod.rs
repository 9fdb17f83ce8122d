//! Domain types for leverage sizing.
//!
//! This module provides:
//! - The fixed-point Decimal engine with explicit rounding
//! - Domain primitives: Address, Symbol, Asset, BaseUnits
//! - ETH-denominated prices and lending-pool readouts
//! - The closed set of rejection reasons reported by the external pool

pub mod decimal;
pub mod position;
pub mod price;
pub mod primitives;
pub mod rejection;

pub use decimal::{ArithmeticError, Decimal, RoundingMode, BPS_DENOMINATOR, MAX_SCALE};
pub use position::{LeverageParameters, PositionSnapshot, ReserveConfiguration, WithdrawalRequest};
pub use price::Price;
pub use primitives::{Address, Asset, BaseUnits, PoolId, Symbol};
pub use rejection::RejectionReason;
