//! Swap route description.
//!
//! A route is an ordered chain of pool hops, each naming the pool operation
//! that moves the position one token closer to its destination. Routes are
//! padded into fixed-size paths for the router, and up to
//! [`MAX_PARALLEL_PATHS`] paths are bundled for a single logical swap.

use crate::domain::{Address, BaseUnits, PoolId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hop slots in one router path.
pub const MAX_HOPS: usize = 4;

/// Path slots in one router bundle.
pub const MAX_PARALLEL_PATHS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("route has {len} hops, the router accepts at most {max}")]
    PathTooLong { len: usize, max: usize },
    #[error("route has no hops")]
    EmptyRoute,
    #[error("hop {index} does not start where the previous hop ends")]
    Discontinuous { index: usize },
    #[error("operation {0:?} cannot appear in a live route")]
    UnsupportedOperation(SwapOp),
    #[error("swap input amount must be greater than zero")]
    ZeroInAmount,
    #[error("bundle has {count} paths, the router accepts at most {max}")]
    TooManyPaths { count: usize, max: usize },
}

/// Pool operation performed by one hop. Codes match the router's enum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapOp {
    #[default]
    Noop,
    /// Plain exchange between two coins of the same pool.
    Exchange,
    /// Exchange through a meta pool's underlying coins.
    ExchangeUnderlying,
    /// Deposit one coin, receive the pool's LP token.
    AddLiquidity,
    /// Burn the pool's LP token, receive a single coin.
    RemoveLiquidityOneCoin,
}

impl SwapOp {
    pub fn code(self) -> u8 {
        match self {
            SwapOp::Noop => 0,
            SwapOp::Exchange => 1,
            SwapOp::ExchangeUnderlying => 2,
            SwapOp::AddLiquidity => 3,
            SwapOp::RemoveLiquidityOneCoin => 4,
        }
    }

    /// The operation that undoes this one in the same pool.
    pub fn inverse(self) -> Result<SwapOp, RoutingError> {
        match self {
            SwapOp::Noop => Err(RoutingError::UnsupportedOperation(SwapOp::Noop)),
            SwapOp::Exchange => Ok(SwapOp::Exchange),
            SwapOp::ExchangeUnderlying => Ok(SwapOp::ExchangeUnderlying),
            SwapOp::AddLiquidity => Ok(SwapOp::RemoveLiquidityOneCoin),
            SwapOp::RemoveLiquidityOneCoin => Ok(SwapOp::AddLiquidity),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapHop {
    pub source_token: Address,
    pub pool: PoolId,
    pub dest_token: Address,
    pub op: SwapOp,
    /// Coin index of `source_token` inside `pool`.
    pub token_index_from: i32,
    /// Coin index of `dest_token` inside `pool`.
    pub token_index_to: i32,
}

impl SwapHop {
    /// Placeholder for an unused slot: zero addresses, zero indices, `Noop`.
    pub fn noop() -> Self {
        Self {
            source_token: Address::zero(),
            pool: Address::zero(),
            dest_token: Address::zero(),
            op: SwapOp::Noop,
            token_index_from: 0,
            token_index_to: 0,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.op == SwapOp::Noop
    }

    /// The same pool traversed the other way.
    pub fn inverse(&self) -> Result<SwapHop, RoutingError> {
        Ok(SwapHop {
            source_token: self.dest_token.clone(),
            pool: self.pool.clone(),
            dest_token: self.source_token.clone(),
            op: self.op.inverse()?,
            token_index_from: self.token_index_to,
            token_index_to: self.token_index_from,
        })
    }
}

/// A validated chain of 1..=[`MAX_HOPS`] live hops.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SwapRoute {
    hops: Vec<SwapHop>,
}

impl SwapRoute {
    pub fn new(hops: Vec<SwapHop>) -> Result<Self, RoutingError> {
        if hops.is_empty() {
            return Err(RoutingError::EmptyRoute);
        }
        if hops.len() > MAX_HOPS {
            return Err(RoutingError::PathTooLong {
                len: hops.len(),
                max: MAX_HOPS,
            });
        }
        if let Some(hop) = hops.iter().find(|hop| hop.is_noop()) {
            return Err(RoutingError::UnsupportedOperation(hop.op));
        }
        for (index, pair) in hops.windows(2).enumerate() {
            if pair[0].dest_token != pair[1].source_token {
                return Err(RoutingError::Discontinuous { index: index + 1 });
            }
        }
        Ok(Self { hops })
    }

    pub fn hops(&self) -> &[SwapHop] {
        &self.hops
    }

    pub fn swap_from(&self) -> &Address {
        &self.hops[0].source_token
    }

    pub fn swap_to(&self) -> &Address {
        &self.hops[self.hops.len() - 1].dest_token
    }

    /// Tokens visited, from `swap_from` to `swap_to` inclusive.
    pub fn token_sequence(&self) -> Vec<Address> {
        std::iter::once(self.swap_from().clone())
            .chain(self.hops.iter().map(|hop| hop.dest_token.clone()))
            .collect()
    }

    /// Route back from `swap_to` to `swap_from` through the same pools.
    pub fn reversed(&self) -> Result<SwapRoute, RoutingError> {
        let hops = self
            .hops
            .iter()
            .rev()
            .map(SwapHop::inverse)
            .collect::<Result<Vec<_>, _>>()?;
        SwapRoute::new(hops)
    }

    /// Pad into a router path carrying the given amounts.
    pub fn to_path(
        &self,
        in_amount: BaseUnits,
        min_out_amount: BaseUnits,
    ) -> Result<SwapPath, RoutingError> {
        if in_amount.is_zero() {
            return Err(RoutingError::ZeroInAmount);
        }
        Ok(SwapPath {
            hops: std::array::from_fn(|i| self.hops.get(i).cloned().unwrap_or_else(SwapHop::noop)),
            swap_from: self.swap_from().clone(),
            swap_to: self.swap_to().clone(),
            in_amount,
            min_out_amount,
        })
    }
}

/// Fixed-size path as the router consumes it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapPath {
    pub hops: [SwapHop; MAX_HOPS],
    pub swap_from: Address,
    pub swap_to: Address,
    pub in_amount: BaseUnits,
    pub min_out_amount: BaseUnits,
}

impl SwapPath {
    /// Placeholder for an unused bundle slot. Every call yields an identical value.
    pub fn noop() -> Self {
        Self {
            hops: std::array::from_fn(|_| SwapHop::noop()),
            swap_from: Address::zero(),
            swap_to: Address::zero(),
            in_amount: BaseUnits::zero(),
            min_out_amount: BaseUnits::zero(),
        }
    }

    pub fn is_noop(&self) -> bool {
        *self == SwapPath::noop()
    }

    pub fn active_hops(&self) -> impl Iterator<Item = &SwapHop> {
        self.hops.iter().filter(|hop| !hop.is_noop())
    }
}

/// Up to [`MAX_PARALLEL_PATHS`] paths splitting one logical swap.
///
/// Only built through [`SwapBundle::single`] and [`SwapBundle::split`], so
/// `path_length` always indexes inside `paths`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapBundle {
    paths: [SwapPath; MAX_PARALLEL_PATHS],
    path_length: u8,
}

impl SwapBundle {
    pub fn single(path: SwapPath) -> Self {
        Self {
            paths: [path, SwapPath::noop(), SwapPath::noop()],
            path_length: 1,
        }
    }

    pub fn split(paths: Vec<SwapPath>) -> Result<Self, RoutingError> {
        if paths.is_empty() {
            return Err(RoutingError::EmptyRoute);
        }
        if paths.len() > MAX_PARALLEL_PATHS {
            return Err(RoutingError::TooManyPaths {
                count: paths.len(),
                max: MAX_PARALLEL_PATHS,
            });
        }
        let path_length = paths.len() as u8;
        let mut slots = paths.into_iter();
        Ok(Self {
            paths: std::array::from_fn(|_| slots.next().unwrap_or_else(SwapPath::noop)),
            path_length,
        })
    }

    pub fn paths(&self) -> &[SwapPath; MAX_PARALLEL_PATHS] {
        &self.paths
    }

    pub fn path_length(&self) -> u8 {
        self.path_length
    }

    pub fn active_paths(&self) -> &[SwapPath] {
        &self.paths[..usize::from(self.path_length).min(MAX_PARALLEL_PATHS)]
    }
}
