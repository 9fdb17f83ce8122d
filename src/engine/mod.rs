//! Pure computation engine(s) for leverage sizing and routing.
//!
//! Nothing here performs I/O or keeps state between calls; prices come in
//! through a [`crate::oracle::PriceSnapshot`].

pub mod route;
pub mod sizing;
pub mod withdrawal;

pub use route::{
    RoutingError, SwapBundle, SwapHop, SwapOp, SwapPath, SwapRoute, MAX_HOPS, MAX_PARALLEL_PATHS,
};
pub use sizing::{PositionSizer, SizingError};
pub use withdrawal::WithdrawalSizer;
