//! Serializable market catalogue: assets, LP compositions and swap routes by symbol.

use crate::engine::SwapOp;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarketSpecError {
    #[error("failed to read market catalogue {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid market catalogue: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSpec {
    pub assets: Vec<AssetSpec>,
    #[serde(default)]
    pub composites: Vec<CompositeSpec>,
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSpec {
    pub symbol: String,
    pub address: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeSpec {
    pub lp: String,
    pub constituents: Vec<String>,
}

/// One forward route; the reverse is derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSpec {
    pub hops: Vec<HopSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HopSpec {
    pub from: String,
    pub pool: String,
    pub to: String,
    pub op: SwapOp,
    #[serde(default)]
    pub index_from: i32,
    #[serde(default)]
    pub index_to: i32,
}

impl MarketSpec {
    pub fn from_json(json: &str) -> Result<Self, MarketSpecError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, MarketSpecError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| MarketSpecError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }
}
