pub mod client;
pub mod models;

pub use client::ProxyClient;
pub use models::{
    ApiError, ConvertResponse, HistoryResponse, PriceResponse, TopItem, TopQuery, TopResponse,
};
