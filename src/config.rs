use crate::domain::{Symbol, BPS_DENOMINATOR};
use crate::market::{MarketSpec, MarketSpecError};
use crate::orchestration::PlannerSettings;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub lending_gateway_url: String,
    pub market_config_path: String,
    pub default_slippage_bps: u32,
    pub swap_in_buffer_bps: u32,
    pub swap_in_buffer_overrides: HashMap<Symbol, u32>,
    pub max_leverage_bps: u32,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let lending_gateway_url = env_map
            .get("LENDING_GATEWAY_URL")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("LENDING_GATEWAY_URL".to_string()))?;

        let market_config_path = env_map
            .get("MARKET_CONFIG_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("MARKET_CONFIG_PATH".to_string()))?;

        let default_slippage_bps = parse_ratio_bps(&env_map, "DEFAULT_SLIPPAGE_BPS", "60")?;
        let swap_in_buffer_bps = parse_ratio_bps(&env_map, "SWAP_IN_BUFFER_BPS", "60")?;
        let swap_in_buffer_overrides = parse_buffer_overrides(&env_map)?;

        let max_leverage_bps = env_map
            .get("MAX_LEVERAGE_BPS")
            .map(|s| s.as_str())
            .unwrap_or("100000")
            .parse::<u32>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "MAX_LEVERAGE_BPS".to_string(),
                    "must be a valid u32".to_string(),
                )
            })?;

        Ok(Config {
            port,
            lending_gateway_url,
            market_config_path,
            default_slippage_bps,
            swap_in_buffer_bps,
            swap_in_buffer_overrides,
            max_leverage_bps,
        })
    }

    pub fn planner_settings(&self) -> PlannerSettings {
        PlannerSettings {
            default_slippage_bps: self.default_slippage_bps,
            swap_in_buffer_bps: self.swap_in_buffer_bps,
            swap_in_buffer_overrides: self.swap_in_buffer_overrides.clone(),
            max_leverage_bps: self.max_leverage_bps,
        }
    }

    /// Read the market catalogue named by `MARKET_CONFIG_PATH`.
    pub fn load_market_spec(&self) -> Result<MarketSpec, MarketSpecError> {
        MarketSpec::load(&self.market_config_path)
    }
}

/// A basis-point ratio that must stay below 100%.
fn parse_ratio_bps(
    env_map: &HashMap<String, String>,
    key: &str,
    default: &str,
) -> Result<u32, ConfigError> {
    let raw = env_map.get(key).map(|s| s.as_str()).unwrap_or(default);
    check_ratio_bps(key, raw)
}

fn check_ratio_bps(key: &str, raw: &str) -> Result<u32, ConfigError> {
    match raw.trim().parse::<u32>() {
        Ok(bps) if bps < BPS_DENOMINATOR => Ok(bps),
        _ => Err(ConfigError::InvalidValue(
            key.to_string(),
            format!("must be basis points below {}, got {}", BPS_DENOMINATOR, raw),
        )),
    }
}

/// `SYMBOL=bps,SYMBOL=bps`
fn parse_buffer_overrides(
    env_map: &HashMap<String, String>,
) -> Result<HashMap<Symbol, u32>, ConfigError> {
    const KEY: &str = "SWAP_IN_BUFFER_OVERRIDES";
    let Some(raw) = env_map.get(KEY) else {
        return Ok(HashMap::new());
    };

    let mut overrides = HashMap::new();
    for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (symbol, bps) = entry.split_once('=').ok_or_else(|| {
            ConfigError::InvalidValue(KEY.to_string(), format!("expected SYMBOL=bps, got {}", entry))
        })?;
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(ConfigError::InvalidValue(
                KEY.to_string(),
                format!("missing symbol in {}", entry),
            ));
        }
        overrides.insert(Symbol::new(symbol.to_string()), check_ratio_bps(KEY, bps)?);
    }
    Ok(overrides)
}
