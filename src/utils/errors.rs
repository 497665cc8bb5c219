use thiserror::Error;

use crate::api::proxy::ApiError;

/// Errors surfaced by a single user action
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad user input, raised before any network call
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Render error: {0}")]
    Render(String),
    #[error("Theme storage error: {0}")]
    Theme(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Turn an error into the line shown to the user
///
/// Transport failures get a generic hint, everything else keeps its message:
/// "Application Error: CoinGecko returned 429" -> "❌ CoinGecko returned 429"
pub fn user_message(err: &AppError) -> String {
    match err {
        AppError::Validation(msg) => format!("⚠️ {}", msg),
        AppError::Api(ApiError::RequestError(msg)) => {
            format!("⚠️ Network Error: the proxy is unreachable ({})", msg)
        }
        AppError::Api(ApiError::Application(msg)) => format!("❌ {}", msg),
        other => format!("❌ {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message() {
        let validation = AppError::Validation("coin_id is required".to_string());
        assert_eq!(user_message(&validation), "⚠️ coin_id is required");

        let app = AppError::Api(ApiError::Application("CoinGecko returned 429".to_string()));
        assert_eq!(user_message(&app), "❌ CoinGecko returned 429");

        let http = AppError::Api(ApiError::HttpError(502, "bad gateway".to_string()));
        assert_eq!(user_message(&http), "❌ HTTP Error (502): bad gateway");
    }
}
