use chrono::{DateTime, Utc};

use crate::api::proxy::PriceResponse;
use crate::services::convert_service::CACHE_MARK;
use crate::utils::errors::AppError;
use crate::utils::format::format_percent;

/// A validated quick-quote request
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRequest {
    pub coin_id: String,
    pub vs: String,
}

impl QuoteRequest {
    pub fn parse(coin_id: &str, vs: &str) -> Result<Self, AppError> {
        let coin_id = coin_id.trim().to_lowercase();
        if coin_id.is_empty() {
            return Err(AppError::Validation("Enter a coin id (e.g. bitcoin)".to_string()));
        }
        let vs = vs.trim().to_lowercase();
        if vs.is_empty() {
            return Err(AppError::Validation("Enter a target currency (e.g. usd)".to_string()));
        }
        Ok(Self { coin_id, vs })
    }
}

/// `1 bitcoin = 65000.12345678 usd · 24h: 1.25% · 2023-11-14 22:13 UTC`
pub fn describe_quote(response: &PriceResponse) -> String {
    let mut line = format!("1 {} = {:.8} {}", response.coin_id, response.price, response.vs);
    if response.change_24h.is_some() {
        line.push_str(&format!(" · 24h: {}", format_percent(response.change_24h)));
    }
    if let Some(updated) = response
        .last_updated_at
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
    {
        line.push_str(&format!(" · {}", updated.format("%Y-%m-%d %H:%M UTC")));
    }
    if response.cached {
        line.push_str(CACHE_MARK);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_line() {
        let response = PriceResponse {
            coin_id: "bitcoin".to_string(),
            vs: "usd".to_string(),
            price: 65000.12345678,
            last_updated_at: Some(1_700_000_000),
            change_24h: Some(1.254),
            cached: true,
        };
        assert_eq!(describe_quote(&response), "1 bitcoin = 65000.12345678 usd · 24h: 1.25% · 2023-11-14 22:13 UTC · кэш");
    }

    #[test]
    fn test_quote_validation() {
        assert!(QuoteRequest::parse("", "usd").is_err());
        assert_eq!(
            QuoteRequest::parse(" ETHEREUM", "EUR").unwrap(),
            QuoteRequest { coin_id: "ethereum".to_string(), vs: "eur".to_string() }
        );
    }
}
