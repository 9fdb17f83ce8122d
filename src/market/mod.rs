//! Immutable market context: registered assets, LP topologies, routes and
//! the resolved collaborator handles.
//!
//! Assembled once through [`MarketContextBuilder`] and shared read-only.

use crate::datasource::{LendingPool, PoolStateReader, PriceOracle, SwapQuoter};
use crate::domain::{Address, Asset, Symbol};
use crate::engine::{RoutingError, SwapHop, SwapRoute};
use crate::oracle::{CompositeDefinition, OracleAdapter};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;

pub mod spec;

pub use spec::{AssetSpec, CompositeSpec, HopSpec, MarketSpec, MarketSpecError, RouteSpec};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContextError {
    #[error("unknown asset: {0}")]
    UnknownAsset(String),
    #[error("asset {0} registered twice")]
    DuplicateAsset(Symbol),
    #[error("address {address} registered for both {first} and {second}")]
    DuplicateAddress {
        address: Address,
        first: Symbol,
        second: Symbol,
    },
    #[error("route from {from} to {to} registered twice")]
    DuplicateRoute { from: Address, to: Address },
    #[error("no route between {from} and {to}")]
    NoRoute { from: Symbol, to: Symbol },
    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),
    #[error(transparent)]
    Routing(#[from] RoutingError),
}

#[derive(Debug, Default)]
pub struct MarketContextBuilder {
    assets: BTreeMap<Symbol, Asset>,
    composites: Vec<(Symbol, Vec<Symbol>)>,
    routes: Vec<SwapRoute>,
    oracle: Option<Arc<dyn PriceOracle>>,
    lending_pool: Option<Arc<dyn LendingPool>>,
    pool_reader: Option<Arc<dyn PoolStateReader>>,
    quoter: Option<Arc<dyn SwapQuoter>>,
}

impl MarketContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed assets, composites and routes from a catalogue.
    pub fn from_spec(spec: &MarketSpec) -> Result<Self, ContextError> {
        let mut builder = Self::new();
        for asset in &spec.assets {
            builder = builder.with_asset(Asset::new(
                Address::new(asset.address.clone()),
                Symbol::new(asset.symbol.clone()),
                asset.decimals,
            ))?;
        }
        for composite in &spec.composites {
            let constituents: Vec<&str> =
                composite.constituents.iter().map(String::as_str).collect();
            builder = builder.with_composite(&composite.lp, &constituents);
        }
        for route in &spec.routes {
            let hops = route
                .hops
                .iter()
                .map(|hop| builder.resolve_hop(hop))
                .collect::<Result<Vec<_>, _>>()?;
            builder = builder.with_route(SwapRoute::new(hops)?);
        }
        Ok(builder)
    }

    pub fn with_asset(mut self, asset: Asset) -> Result<Self, ContextError> {
        if self.assets.contains_key(&asset.symbol) {
            return Err(ContextError::DuplicateAsset(asset.symbol));
        }
        self.assets.insert(asset.symbol.clone(), asset);
        Ok(self)
    }

    /// Register an LP token priced from its pool; symbols are resolved at build.
    pub fn with_composite(mut self, lp: &str, constituents: &[&str]) -> Self {
        self.composites.push((
            Symbol::new(lp.to_string()),
            constituents
                .iter()
                .map(|s| Symbol::new(s.to_string()))
                .collect(),
        ));
        self
    }

    pub fn with_route(mut self, route: SwapRoute) -> Self {
        self.routes.push(route);
        self
    }

    pub fn with_oracle(mut self, oracle: Arc<dyn PriceOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn with_lending_pool(mut self, lending_pool: Arc<dyn LendingPool>) -> Self {
        self.lending_pool = Some(lending_pool);
        self
    }

    pub fn with_pool_reader(mut self, pool_reader: Arc<dyn PoolStateReader>) -> Self {
        self.pool_reader = Some(pool_reader);
        self
    }

    pub fn with_quoter(mut self, quoter: Arc<dyn SwapQuoter>) -> Self {
        self.quoter = Some(quoter);
        self
    }

    fn lookup(&self, symbol: &str) -> Result<&Asset, ContextError> {
        self.assets
            .get(&Symbol::new(symbol.to_string()))
            .ok_or_else(|| ContextError::UnknownAsset(symbol.to_string()))
    }

    fn resolve_hop(&self, hop: &HopSpec) -> Result<SwapHop, ContextError> {
        Ok(SwapHop {
            source_token: self.lookup(&hop.from)?.address.clone(),
            pool: Address::new(hop.pool.clone()),
            dest_token: self.lookup(&hop.to)?.address.clone(),
            op: hop.op,
            token_index_from: hop.index_from,
            token_index_to: hop.index_to,
        })
    }

    /// Resolve every handle and cross-check the catalogue.
    pub fn build(self) -> Result<MarketContext, ContextError> {
        let oracle = self
            .oracle
            .clone()
            .ok_or(ContextError::MissingCollaborator("price oracle"))?;
        let lending_pool = self
            .lending_pool
            .clone()
            .ok_or(ContextError::MissingCollaborator("lending pool"))?;
        if !self.composites.is_empty() && self.pool_reader.is_none() {
            return Err(ContextError::MissingCollaborator("pool state reader"));
        }

        let mut definitions = Vec::with_capacity(self.composites.len());
        for (lp, constituents) in &self.composites {
            let constituents = constituents
                .iter()
                .map(|symbol| self.lookup(symbol.as_str()).cloned())
                .collect::<Result<Vec<_>, _>>()?;
            definitions.push(CompositeDefinition {
                lp_token: self.lookup(lp.as_str())?.clone(),
                constituents,
            });
        }

        let mut by_address: HashMap<Address, Asset> = HashMap::with_capacity(self.assets.len());
        for asset in self.assets.values() {
            if let Some(first) = by_address.insert(asset.address.clone(), asset.clone()) {
                return Err(ContextError::DuplicateAddress {
                    address: asset.address.clone(),
                    first: first.symbol,
                    second: asset.symbol.clone(),
                });
            }
        }

        let mut routes = HashMap::with_capacity(self.routes.len());
        for route in self.routes {
            for token in route.token_sequence() {
                if !by_address.contains_key(&token) {
                    return Err(ContextError::UnknownAsset(token.to_string()));
                }
            }
            let key = (route.swap_from().clone(), route.swap_to().clone());
            if routes.contains_key(&key) {
                return Err(ContextError::DuplicateRoute {
                    from: key.0,
                    to: key.1,
                });
            }
            routes.insert(key, route);
        }

        Ok(MarketContext {
            oracle: OracleAdapter::new(oracle, self.pool_reader, definitions),
            assets: self.assets,
            by_address,
            routes,
            lending_pool,
            quoter: self.quoter,
        })
    }
}

#[derive(Debug)]
pub struct MarketContext {
    assets: BTreeMap<Symbol, Asset>,
    by_address: HashMap<Address, Asset>,
    routes: HashMap<(Address, Address), SwapRoute>,
    oracle: OracleAdapter,
    lending_pool: Arc<dyn LendingPool>,
    quoter: Option<Arc<dyn SwapQuoter>>,
}

impl MarketContext {
    pub fn builder() -> MarketContextBuilder {
        MarketContextBuilder::new()
    }

    pub fn asset(&self, symbol: &str) -> Result<&Asset, ContextError> {
        self.assets
            .get(&Symbol::new(symbol.to_string()))
            .ok_or_else(|| ContextError::UnknownAsset(symbol.to_string()))
    }

    pub fn asset_by_address(&self, address: &Address) -> Option<&Asset> {
        self.by_address.get(address)
    }

    pub fn assets(&self) -> impl Iterator<Item = &Asset> {
        self.assets.values()
    }

    /// Registered route from `from` to `to`, or the reverse of a registered
    /// route in the other direction.
    pub fn route(&self, from: &Asset, to: &Asset) -> Result<SwapRoute, ContextError> {
        let forward_key = (from.address.clone(), to.address.clone());
        if let Some(route) = self.routes.get(&forward_key) {
            return Ok(route.clone());
        }
        let reverse_key = (to.address.clone(), from.address.clone());
        match self.routes.get(&reverse_key) {
            Some(route) => Ok(route.reversed()?),
            None => Err(ContextError::NoRoute {
                from: from.symbol.clone(),
                to: to.symbol.clone(),
            }),
        }
    }

    pub fn oracle_adapter(&self) -> &OracleAdapter {
        &self.oracle
    }

    pub fn lending_pool(&self) -> &dyn LendingPool {
        self.lending_pool.as_ref()
    }

    pub fn quoter(&self) -> Option<&dyn SwapQuoter> {
        self.quoter.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::MockMarket;
    use crate::engine::SwapOp;

    fn catalogue() -> MarketSpec {
        MarketSpec::from_json(
            r#"{
                "assets": [
                    {"symbol": "USDC", "address": "0x01", "decimals": 6},
                    {"symbol": "FRAX", "address": "0x02", "decimals": 18},
                    {"symbol": "FRAXBP", "address": "0x03", "decimals": 18}
                ],
                "composites": [{"lp": "FRAXBP", "constituents": ["FRAX", "USDC"]}],
                "routes": [{"hops": [
                    {"from": "USDC", "pool": "0xp1", "to": "FRAXBP", "op": "add_liquidity", "indexFrom": 1}
                ]}]
            }"#,
        )
        .unwrap()
    }

    fn with_collaborators(builder: MarketContextBuilder) -> MarketContextBuilder {
        let market = Arc::new(MockMarket::new());
        builder
            .with_oracle(market.clone())
            .with_lending_pool(market.clone())
            .with_pool_reader(market)
    }

    #[test]
    fn test_build_from_catalogue() {
        let context = with_collaborators(MarketContextBuilder::from_spec(&catalogue()).unwrap())
            .build()
            .unwrap();
        let usdc = context.asset("USDC").unwrap().clone();
        let fraxbp = context.asset("FRAXBP").unwrap().clone();

        let forward = context.route(&usdc, &fraxbp).unwrap();
        assert_eq!(forward.hops()[0].op, SwapOp::AddLiquidity);

        let reverse = context.route(&fraxbp, &usdc).unwrap();
        assert_eq!(reverse.hops()[0].op, SwapOp::RemoveLiquidityOneCoin);
        assert_eq!(reverse.swap_to(), &usdc.address);
        assert_eq!(context.assets().count(), 3);
    }

    #[test]
    fn test_missing_route() {
        let context = with_collaborators(MarketContextBuilder::from_spec(&catalogue()).unwrap())
            .build()
            .unwrap();
        let usdc = context.asset("USDC").unwrap().clone();
        let frax = context.asset("FRAX").unwrap().clone();
        assert!(matches!(
            context.route(&usdc, &frax),
            Err(ContextError::NoRoute { .. })
        ));
    }

    #[test]
    fn test_missing_collaborators() {
        let builder = MarketContextBuilder::from_spec(&catalogue()).unwrap();
        assert_eq!(
            builder.build().unwrap_err(),
            ContextError::MissingCollaborator("price oracle")
        );

        let market = Arc::new(MockMarket::new());
        let builder = MarketContextBuilder::from_spec(&catalogue())
            .unwrap()
            .with_oracle(market.clone())
            .with_lending_pool(market);
        assert_eq!(
            builder.build().unwrap_err(),
            ContextError::MissingCollaborator("pool state reader")
        );
    }

    #[test]
    fn test_unknown_symbol_in_route() {
        let mut spec = catalogue();
        spec.routes[0].hops[0].to = "CRV".to_string();
        assert_eq!(
            MarketContextBuilder::from_spec(&spec).unwrap_err(),
            ContextError::UnknownAsset("CRV".to_string())
        );
    }

    #[test]
    fn test_unknown_composite_constituent() {
        let mut spec = catalogue();
        spec.composites[0].constituents.push("DAI".to_string());
        let err = with_collaborators(MarketContextBuilder::from_spec(&spec).unwrap())
            .build()
            .unwrap_err();
        assert_eq!(err, ContextError::UnknownAsset("DAI".to_string()));
    }

    #[test]
    fn test_duplicate_asset() {
        let mut spec = catalogue();
        spec.assets.push(spec.assets[0].clone());
        assert_eq!(
            MarketContextBuilder::from_spec(&spec).unwrap_err(),
            ContextError::DuplicateAsset(Symbol::new("USDC".to_string()))
        );
    }

    #[test]
    fn test_duplicate_address() {
        let mut spec = catalogue();
        let mut alias = spec.assets[0].clone();
        alias.symbol = "USDC.e".to_string();
        spec.assets.push(alias);
        let err = with_collaborators(MarketContextBuilder::from_spec(&spec).unwrap())
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ContextError::DuplicateAddress {
                address: Address::new("0x01".to_string()),
                first: Symbol::new("USDC".to_string()),
                second: Symbol::new("USDC.e".to_string()),
            }
        );
    }

    #[test]
    fn test_duplicate_route() {
        let mut spec = catalogue();
        let mut second = spec.routes[0].clone();
        second.hops[0].pool = "0xp2".to_string();
        spec.routes.push(second);
        let err = with_collaborators(MarketContextBuilder::from_spec(&spec).unwrap())
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ContextError::DuplicateRoute {
                from: Address::new("0x01".to_string()),
                to: Address::new("0x03".to_string()),
            }
        );
    }
}
