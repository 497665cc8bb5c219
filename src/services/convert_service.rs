use tracing::info;

use crate::api::proxy::{ApiError, ConvertResponse};
use crate::utils::errors::{user_message, AppError};
use crate::utils::format::format_amount;

/// Marker appended to results served from the proxy cache
pub const CACHE_MARK: &str = " · кэш";

/// A validated conversion request
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertRequest {
    pub coin_id: String,
    pub vs: String,
    pub amount: f64,
}

impl ConvertRequest {
    /// Validate converter input before any network call
    pub fn parse(coin_id: &str, vs: &str, amount: &str) -> Result<Self, AppError> {
        let coin_id = coin_id.trim().to_lowercase();
        if coin_id.is_empty() {
            return Err(AppError::Validation("Enter a coin id (e.g. bitcoin)".to_string()));
        }

        let vs = vs.trim().to_lowercase();
        if vs.is_empty() {
            return Err(AppError::Validation("Enter a target currency (e.g. usd)".to_string()));
        }

        let amount: f64 = amount
            .trim()
            .parse()
            .map_err(|_| AppError::Validation(format!("Invalid amount: '{}'", amount.trim())))?;
        if !amount.is_finite() {
            return Err(AppError::Validation(format!("Invalid amount: '{}'", amount)));
        }

        Ok(Self { coin_id, vs, amount })
    }
}

/// `2 bitcoin = 130000.24691356 usd (курс: 65000.12345678) · кэш`
pub fn describe_conversion(request: &ConvertRequest, response: &ConvertResponse) -> String {
    let mut line = format!(
        "{} {} = {:.8} {} (курс: {:.8})",
        format_amount(request.amount),
        response.coin_id,
        response.result,
        response.vs,
        response.rate
    );
    if response.cached {
        line.push_str(CACHE_MARK);
    }
    line
}

/// Content of the converter's result region
#[derive(Debug, Clone, PartialEq)]
pub enum ConverterDisplay {
    Idle,
    Pending,
    Success(String),
    /// Shown error-styled
    Error(String),
}

/// Single-shot conversion panel
#[derive(Debug)]
pub struct ConverterPanel {
    display: ConverterDisplay,
}

impl Default for ConverterPanel {
    fn default() -> Self {
        Self {
            display: ConverterDisplay::Idle,
        }
    }
}

impl ConverterPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn display(&self) -> &ConverterDisplay {
        &self.display
    }

    /// Validate the form; on success the panel waits for the response
    pub fn begin(&mut self, coin_id: &str, vs: &str, amount: &str) -> Result<ConvertRequest, AppError> {
        match ConvertRequest::parse(coin_id, vs, amount) {
            Ok(request) => {
                info!("Converting {} {} to {}", request.amount, request.coin_id, request.vs);
                self.display = ConverterDisplay::Pending;
                Ok(request)
            }
            Err(e) => {
                self.display = ConverterDisplay::Error(user_message(&e));
                Err(e)
            }
        }
    }

    pub fn complete(&mut self, request: &ConvertRequest, result: Result<ConvertResponse, ApiError>) {
        self.display = match result {
            Ok(response) => ConverterDisplay::Success(describe_conversion(request, &response)),
            Err(e) => ConverterDisplay::Error(user_message(&AppError::Api(e))),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(cached: bool) -> ConvertResponse {
        ConvertResponse {
            coin_id: "bitcoin".to_string(),
            vs: "usd".to_string(),
            rate: 65000.12345678,
            result: 130000.24691356,
            cached,
        }
    }

    #[test]
    fn test_conversion_scenario() {
        let mut panel = ConverterPanel::new();
        let request = panel.begin("bitcoin", "usd", "2").unwrap();
        assert_eq!(panel.display(), &ConverterDisplay::Pending);

        panel.complete(&request, Ok(response(true)));
        assert_eq!(
            panel.display(),
            &ConverterDisplay::Success(
                "2 bitcoin = 130000.24691356 usd (курс: 65000.12345678) · кэш".to_string()
            )
        );
    }

    #[test]
    fn test_uncached_has_no_mark() {
        let request = ConvertRequest::parse("Bitcoin ", "USD", "0.5").unwrap();
        assert_eq!(
            describe_conversion(&request, &response(false)),
            "0.5 bitcoin = 130000.24691356 usd (курс: 65000.12345678)"
        );
    }

    #[test]
    fn test_empty_coin_is_validation_error() {
        let mut panel = ConverterPanel::new();
        let err = panel.begin("   ", "usd", "1").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(matches!(panel.display(), ConverterDisplay::Error(_)));
    }

    #[test]
    fn test_bad_amount_is_validation_error() {
        assert!(matches!(ConvertRequest::parse("bitcoin", "usd", "two"), Err(AppError::Validation(_))));
        assert!(matches!(ConvertRequest::parse("bitcoin", "usd", "inf"), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_failure_goes_to_error_region() {
        let mut panel = ConverterPanel::new();
        let request = panel.begin("bitcoin", "usd", "1").unwrap();
        panel.complete(&request, Err(ApiError::Application("No price found".to_string())));
        assert_eq!(panel.display(), &ConverterDisplay::Error("❌ No price found".to_string()));
    }
}
