use serde::Deserialize;
use thiserror::Error;

use crate::models::HistoryPoint;

/// Largest page size the proxy accepts
pub const MAX_PER_PAGE: u32 = 250;

/// Parameters of a `/cg/top` request, also used for the CSV export link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopQuery {
    pub vs: String,
    pub per_page: u32,
    pub page: u32,
}

impl TopQuery {
    /// Normalizes the currency and clamps `per_page` to 1..=250. Always page 1.
    pub fn new(vs: &str, per_page: u32) -> Self {
        Self {
            vs: vs.trim().to_lowercase(),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
            page: 1,
        }
    }

    pub fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("vs", self.vs.clone()),
            ("per_page", self.per_page.to_string()),
            ("page", self.page.to_string()),
        ]
    }
}

/// One entry of `/cg/top` items
#[derive(Debug, Clone, Deserialize)]
pub struct TopItem {
    pub market_cap_rank: Option<i64>,
    pub id: Option<String>,
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub price_change_percentage_24h: Option<f64>,
}

/// Response from GET /cg/top
#[derive(Debug, Clone, Deserialize)]
pub struct TopResponse {
    #[serde(default)]
    pub items: Vec<TopItem>,
    #[serde(default)]
    pub cached: bool,
}

/// Response from GET /cg/convert
#[derive(Debug, Clone, Deserialize)]
pub struct ConvertResponse {
    pub coin_id: String,
    pub vs: String,
    pub rate: f64,
    pub result: f64,
    #[serde(default)]
    pub cached: bool,
}

/// Response from GET /cg/history
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub points: Vec<HistoryPoint>,
    #[serde(default)]
    pub cached: bool,
}

/// Response from GET /cg/price
#[derive(Debug, Clone, Deserialize)]
pub struct PriceResponse {
    pub coin_id: String,
    pub vs: String,
    pub price: f64,
    pub last_updated_at: Option<i64>,
    pub change_24h: Option<f64>,
    #[serde(default)]
    pub cached: bool,
}

/// Error type for proxy calls
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Network/request error
    #[error("Request Error: {0}")]
    RequestError(String),
    /// Non-success status without an `error` field
    #[error("HTTP Error ({0}): {1}")]
    HttpError(u16, String),
    /// Body is not the expected JSON
    #[error("Deserialization Error: {0}")]
    DeserializationError(String),
    /// The proxy answered with an `error` field
    #[error("{0}")]
    Application(String),
}
