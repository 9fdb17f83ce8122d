//! JSON-over-HTTP gateway to the lending system's read endpoints.
//!
//! Every call is a `POST {base}/rpc` with `{"method": ..., "params": ...}`.
//! A body carrying `{"revert": "<code>"}` is mapped to a [`RejectionReason`].

use super::{CollaboratorError, LendingPool, PoolStateReader, PriceOracle};
use crate::domain::{
    Address, Asset, BaseUnits, PositionSnapshot, Price, RejectionReason, ReserveConfiguration,
};
use crate::oracle::PoolComposition;
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct HttpLendingGateway {
    client: Client,
    base_url: String,
    max_elapsed: Duration,
}

impl HttpLendingGateway {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            max_elapsed: Duration::from_secs(30),
        }
    }

    /// Cap on the total time spent retrying transient failures.
    pub fn with_max_elapsed(mut self, max_elapsed: Duration) -> Self {
        self.max_elapsed = max_elapsed;
        self
    }

    async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, CollaboratorError> {
        let url = format!("{}/rpc", self.base_url);
        let payload = serde_json::json!({ "method": method, "params": params });
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(self.max_elapsed),
            ..Default::default()
        };

        retry(backoff, || async {
            let response = self
                .client
                .post(&url)
                .json(&payload)
                .send()
                .await
                .map_err(|e| {
                    backoff::Error::transient(CollaboratorError::NetworkError(e.to_string()))
                })?;

            let status = response.status();
            if status == 429 {
                warn!("Gateway rate limited {}", method);
                return Err(backoff::Error::transient(CollaboratorError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(CollaboratorError::HttpError {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                let body = response
                    .json::<serde_json::Value>()
                    .await
                    .unwrap_or(serde_json::Value::Null);
                let err = match parse_revert(&body) {
                    Some(reason) => CollaboratorError::Rejected(reason),
                    None => CollaboratorError::HttpError {
                        status: status.as_u16(),
                        message: "Client error".to_string(),
                    },
                };
                return Err(backoff::Error::permanent(err));
            }

            let body = response.json::<serde_json::Value>().await.map_err(|e| {
                backoff::Error::permanent(CollaboratorError::ParseError(e.to_string()))
            })?;
            match parse_revert(&body) {
                Some(reason) => Err(backoff::Error::permanent(CollaboratorError::Rejected(reason))),
                None => Ok(body),
            }
        })
        .await
    }
}

#[async_trait]
impl PriceOracle for HttpLendingGateway {
    async fn get_asset_price(&self, asset: &Asset) -> Result<Price, CollaboratorError> {
        debug!("Fetching price for asset={}", asset);
        let body = self
            .call(
                "getAssetPrice",
                serde_json::json!({ "asset": asset.address.as_str() }),
            )
            .await?;
        parse_price(&body, asset)
    }
}

#[async_trait]
impl LendingPool for HttpLendingGateway {
    async fn get_user_account_data(
        &self,
        user: &Address,
    ) -> Result<PositionSnapshot, CollaboratorError> {
        debug!("Fetching account data for user={}", user);
        let body = self
            .call(
                "getUserAccountData",
                serde_json::json!({ "user": user.as_str() }),
            )
            .await?;
        serde_json::from_value(body)
            .map_err(|e| CollaboratorError::ParseError(format!("Invalid account data: {}", e)))
    }

    async fn get_reserve_configuration_data(
        &self,
        asset: &Asset,
    ) -> Result<ReserveConfiguration, CollaboratorError> {
        debug!("Fetching reserve configuration for asset={}", asset);
        let body = self
            .call(
                "getReserveConfigurationData",
                serde_json::json!({ "asset": asset.address.as_str() }),
            )
            .await?;
        serde_json::from_value(body)
            .map_err(|e| CollaboratorError::ParseError(format!("Invalid reserve data: {}", e)))
    }

    async fn check_leverage_access(
        &self,
        user: &Address,
        collateral: &Asset,
    ) -> Result<(), CollaboratorError> {
        let body = self
            .call(
                "checkLeverageAccess",
                serde_json::json!({
                    "user": user.as_str(),
                    "collateral": collateral.address.as_str(),
                }),
            )
            .await?;
        parse_access(&body)
    }
}

#[async_trait]
impl PoolStateReader for HttpLendingGateway {
    async fn get_pool_composition(
        &self,
        lp_token: &Asset,
        constituents: &[Asset],
    ) -> Result<PoolComposition, CollaboratorError> {
        debug!("Fetching pool composition for lp={}", lp_token);
        let coins: Vec<&str> = constituents.iter().map(|a| a.address.as_str()).collect();
        let body = self
            .call(
                "getPoolComposition",
                serde_json::json!({ "lpToken": lp_token.address.as_str(), "constituents": coins }),
            )
            .await?;
        serde_json::from_value(body)
            .map_err(|e| CollaboratorError::ParseError(format!("Invalid pool composition: {}", e)))
    }
}

fn parse_revert(body: &serde_json::Value) -> Option<RejectionReason> {
    body.get("revert")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse().ok())
}

fn parse_price(body: &serde_json::Value, asset: &Asset) -> Result<Price, CollaboratorError> {
    let wei = match body.get("priceWei") {
        None | Some(serde_json::Value::Null) => {
            return Err(CollaboratorError::NotPriced(asset.symbol.clone()))
        }
        Some(value) => value
            .as_str()
            .ok_or_else(|| CollaboratorError::ParseError("priceWei must be a string".to_string()))?
            .parse::<BaseUnits>()
            .map_err(|e| CollaboratorError::ParseError(format!("Invalid priceWei: {}", e)))?,
    };
    Price::from_wei(wei).map_err(|e| CollaboratorError::ParseError(format!("Invalid price: {}", e)))
}

fn parse_access(body: &serde_json::Value) -> Result<(), CollaboratorError> {
    match body.get("allowed").and_then(|v| v.as_bool()) {
        Some(true) => Ok(()),
        Some(false) => Err(CollaboratorError::Rejected(RejectionReason::NotWhitelisted)),
        None => Err(CollaboratorError::ParseError(
            "Missing allowed field".to_string(),
        )),
    }
}
