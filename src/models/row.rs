//! Market table rows

use crate::api::proxy::TopItem;

/// One coin in the market table
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub rank: Option<i64>,
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub price: Option<f64>,
    pub market_cap: Option<f64>,
    pub change_24h: Option<f64>,
}

impl From<TopItem> for Row {
    fn from(item: TopItem) -> Self {
        Row {
            rank: item.market_cap_rank,
            id: item.id.unwrap_or_default(),
            symbol: item.symbol.unwrap_or_default(),
            name: item.name.unwrap_or_default(),
            price: item.current_price,
            market_cap: item.market_cap,
            change_24h: item.price_change_percentage_24h,
        }
    }
}
