use serde::{Deserialize, Serialize};
use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;

use crate::market::{AgentData, MarketData};

/// Reasons a decision request is rejected before any agent runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid request: market must include symbol and price")]
    InvalidMarket,

    #[error("Invalid request: data is required")]
    MissingData,

    #[error("Invalid request: {0}")]
    Malformed(String),
}

/// A request that passed validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionRequest {
    pub market: MarketData,
    pub data: AgentData,
}

impl DecisionRequest {
    /// Validate a raw `{market, data}` payload.
    ///
    /// Market checks run before the data check, so a request broken in both
    /// places reports the market error. A price, volume or market cap that is
    /// a number but does not fit a `Decimal` counts as an invalid market.
    pub fn from_value(raw: &Value) -> Result<Self, ValidationError> {
        let market = raw
            .get("market")
            .filter(|m| m.is_object())
            .ok_or(ValidationError::InvalidMarket)?;

        let has_symbol = market
            .get("symbol")
            .and_then(Value::as_str)
            .is_some_and(|s| !s.is_empty());
        let has_price = market.get("price").is_some_and(fits_decimal);
        let numbers_in_range = ["volume24h", "marketCap"]
            .iter()
            .filter_map(|key| market.get(*key))
            .filter(|v| v.is_number())
            .all(fits_decimal);
        if !has_symbol || !has_price || !numbers_in_range {
            return Err(ValidationError::InvalidMarket);
        }

        let data = match raw.get("data") {
            None | Some(Value::Null) => return Err(ValidationError::MissingData),
            Some(data) => AgentData(data.clone()),
        };

        let market: MarketData = serde_json::from_value(market.clone())
            .map_err(|e| ValidationError::Malformed(format!("market: {e}")))?;

        Ok(Self { market, data })
    }
}

fn fits_decimal(value: &Value) -> bool {
    value.is_number() && serde_json::from_value::<Decimal>(value.clone()).is_ok()
}
