use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Market observation driving a decision run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MarketData {
    pub symbol: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "volume24h")]
    pub volume_24h: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<Decimal>,
    /// Any further fields the caller sent; forwarded to agents untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl MarketData {
    pub fn new(symbol: impl Into<String>, price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            volume_24h: None,
            market_cap: None,
            extra: serde_json::Map::new(),
        }
    }
}

/// Auxiliary payload handed to every agent as-is.
///
/// Callers usually send `portfolio`, `marketData`, `historicalData` and
/// `sentiment` keys, but nothing here depends on that shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct AgentData(pub serde_json::Value);

impl AgentData {
    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

impl From<serde_json::Value> for AgentData {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}
