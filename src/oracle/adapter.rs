use super::composite::{composite_price, CompositeDefinition, MAX_COMPOSITE_DEPTH};
use super::{OracleError, PriceSnapshot};
use crate::datasource::{CollaboratorError, PoolStateReader, PriceOracle};
use crate::domain::{Address, Asset, Price};
use futures::future::{try_join_all, BoxFuture, FutureExt};
use std::collections::HashMap;
use std::sync::Arc;

/// Resolves ETH prices for plain and composite assets.
///
/// Plain assets are forwarded to the oracle collaborator; registered LP
/// tokens are priced from their pool's balances. Nothing is cached and
/// nothing is retried here.
#[derive(Debug, Clone)]
pub struct OracleAdapter {
    oracle: Arc<dyn PriceOracle>,
    pool_reader: Option<Arc<dyn PoolStateReader>>,
    composites: HashMap<Address, CompositeDefinition>,
}

impl OracleAdapter {
    pub fn new(
        oracle: Arc<dyn PriceOracle>,
        pool_reader: Option<Arc<dyn PoolStateReader>>,
        composites: Vec<CompositeDefinition>,
    ) -> Self {
        let composites = composites
            .into_iter()
            .map(|def| (def.lp_token.address.clone(), def))
            .collect();
        Self {
            oracle,
            pool_reader,
            composites,
        }
    }

    pub async fn get_asset_price(&self, asset: &Asset) -> Result<Price, OracleError> {
        self.price_at_depth(asset, 0).await
    }

    /// Read every listed asset before any arithmetic happens.
    ///
    /// Duplicates are fetched once; reads run concurrently.
    pub async fn snapshot(&self, assets: &[Asset]) -> Result<PriceSnapshot, OracleError> {
        let mut unique: Vec<&Asset> = Vec::with_capacity(assets.len());
        for asset in assets {
            if !unique.iter().any(|a| a.address == asset.address) {
                unique.push(asset);
            }
        }

        let prices = try_join_all(unique.iter().map(|asset| self.get_asset_price(asset))).await?;

        let mut snapshot = PriceSnapshot::new();
        for (asset, price) in unique.into_iter().zip(prices) {
            snapshot.insert(asset, price);
        }
        Ok(snapshot)
    }

    fn price_at_depth<'a>(
        &'a self,
        asset: &'a Asset,
        depth: usize,
    ) -> BoxFuture<'a, Result<Price, OracleError>> {
        async move {
            let Some(definition) = self.composites.get(&asset.address) else {
                return self.direct_price(asset).await;
            };
            if depth >= MAX_COMPOSITE_DEPTH {
                return Err(OracleError::CompositeTooDeep {
                    asset: asset.symbol.clone(),
                    max: MAX_COMPOSITE_DEPTH,
                });
            }
            let reader = self
                .pool_reader
                .as_ref()
                .ok_or_else(|| OracleError::AssetNotPriced(asset.clone()))?;

            let composition = reader
                .get_pool_composition(&definition.lp_token, &definition.constituents)
                .await?;
            let constituent_prices = try_join_all(
                definition
                    .constituents
                    .iter()
                    .map(|constituent| self.price_at_depth(constituent, depth + 1)),
            )
            .await?;

            composite_price(definition, &composition, &constituent_prices)
        }
        .boxed()
    }

    async fn direct_price(&self, asset: &Asset) -> Result<Price, OracleError> {
        match self.oracle.get_asset_price(asset).await {
            Ok(price) => Ok(price),
            Err(CollaboratorError::NotPriced(_)) => Err(OracleError::AssetNotPriced(asset.clone())),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::MockMarket;
    use crate::domain::{BaseUnits, Decimal, Symbol};
    use crate::oracle::PoolComposition;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn asset(addr: &str, symbol: &str, decimals: u8) -> Asset {
        Asset::new(
            Address::new(addr.to_string()),
            Symbol::new(symbol.to_string()),
            decimals,
        )
    }

    fn tokens(n: u128) -> BaseUnits {
        BaseUnits::new(n * 1_000_000_000_000_000_000)
    }

    #[tokio::test]
    async fn test_plain_asset_forwarded() {
        let dai = asset("0xda1", "DAI", 18);
        let market = Arc::new(MockMarket::new().with_price(&dai, Price::from_eth(d("0.0005"))));
        let adapter = OracleAdapter::new(market, None, vec![]);
        assert_eq!(adapter.get_asset_price(&dai).await.unwrap().eth(), d("0.0005"));
    }

    #[tokio::test]
    async fn test_unlisted_asset_not_priced() {
        let dai = asset("0xda1", "DAI", 18);
        let adapter = OracleAdapter::new(Arc::new(MockMarket::new()), None, vec![]);
        assert_eq!(
            adapter.get_asset_price(&dai).await,
            Err(OracleError::AssetNotPriced(dai))
        );
    }

    #[tokio::test]
    async fn test_two_level_lp_of_lp() {
        // TUSDFRAXBP holds TUSD and FRAXBP; FRAXBP holds FRAX and USDC.
        let frax = asset("0xf1", "FRAX", 18);
        let usdc = asset("0xf2", "USDC", 6);
        let tusd = asset("0xf3", "TUSD", 18);
        let fraxbp = asset("0xb1", "FRAXBP", 18);
        let meta = asset("0xb2", "TUSDFRAXBP", 18);

        let fraxbp_def = CompositeDefinition {
            lp_token: fraxbp.clone(),
            constituents: vec![frax.clone(), usdc.clone()],
        };
        let meta_def = CompositeDefinition {
            lp_token: meta.clone(),
            constituents: vec![tusd.clone(), fraxbp.clone()],
        };

        let market = Arc::new(
            MockMarket::new()
                .with_price(&frax, Price::from_eth(d("0.0005")))
                .with_price(&usdc, Price::from_eth(d("0.0005")))
                .with_price(&tusd, Price::from_eth(d("0.0005")))
                .with_composition(
                    &fraxbp,
                    PoolComposition {
                        total_supply: tokens(100),
                        balances: vec![tokens(50), BaseUnits::new(60_000_000)],
                    },
                )
                .with_composition(
                    &meta,
                    PoolComposition {
                        total_supply: tokens(200),
                        balances: vec![tokens(100), tokens(100)],
                    },
                ),
        );
        let adapter = OracleAdapter::new(
            market.clone(),
            Some(market as Arc<dyn PoolStateReader>),
            vec![fraxbp_def, meta_def],
        );

        // FRAXBP = (50 + 60) * 0.0005 / 100 = 0.00055
        assert_eq!(adapter.get_asset_price(&fraxbp).await.unwrap().eth(), d("0.00055"));
        // meta = (100 * 0.0005 + 100 * 0.00055) / 200 = 0.000525
        assert_eq!(adapter.get_asset_price(&meta).await.unwrap().eth(), d("0.000525"));
    }

    #[tokio::test]
    async fn test_self_referencing_composite_is_bounded() {
        let lp = asset("0xb1", "LOOP", 18);
        let def = CompositeDefinition {
            lp_token: lp.clone(),
            constituents: vec![lp.clone()],
        };
        let market = Arc::new(MockMarket::new().with_composition(
            &lp,
            PoolComposition {
                total_supply: tokens(1),
                balances: vec![tokens(1)],
            },
        ));
        let adapter = OracleAdapter::new(
            market.clone(),
            Some(market as Arc<dyn PoolStateReader>),
            vec![def],
        );
        let err = adapter.get_asset_price(&lp).await.unwrap_err();
        assert!(matches!(err, OracleError::CompositeTooDeep { max: 3, .. }));
    }

    #[tokio::test]
    async fn test_snapshot_dedupes_assets() {
        let dai = asset("0xda1", "DAI", 18);
        let usdc = asset("0xc0c", "USDC", 6);
        let market = Arc::new(
            MockMarket::new()
                .with_price(&dai, Price::from_eth(d("0.0005")))
                .with_price(&usdc, Price::from_eth(d("0.0006"))),
        );
        let adapter = OracleAdapter::new(market, None, vec![]);
        let snapshot = adapter
            .snapshot(&[dai.clone(), usdc.clone(), dai.clone()])
            .await
            .unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.price_of(&usdc).unwrap().eth(), d("0.0006"));
    }
}
