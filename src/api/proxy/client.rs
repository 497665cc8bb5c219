use chrono::NaiveDate;
use reqwest::{Client as HttpClient, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::models::{
    ApiError, ConvertResponse, HistoryResponse, PriceResponse, TopQuery, TopResponse,
};
use crate::utils::format::format_amount;

/// HTTP client for the CoinGecko proxy (`/cg/*` endpoints)
#[derive(Clone)]
pub struct ProxyClient {
    http_client: HttpClient,
    base_url: Url,
}

impl ProxyClient {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

    /// Create a client for the proxy at `base_url`, e.g. `http://127.0.0.1:8061`
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let mut base = base_url.trim().to_string();
        // Url::join replaces the last path segment unless the base ends with '/'
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| ApiError::RequestError(format!("Invalid proxy URL '{}': {}", base, e)))?;

        let http_client = HttpClient::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::RequestError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// Build `{base}/{path}?{params}`
    pub fn endpoint(&self, path: &str, params: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| ApiError::RequestError(format!("Invalid endpoint '{}': {}", path, e)))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Link target of the CSV export for the same page as `query`
    pub fn top_csv_url(&self, query: &TopQuery) -> Result<Url, ApiError> {
        self.endpoint("cg/top.csv", &query.params())
    }

    /// GET /cg/top
    pub async fn top(&self, query: &TopQuery) -> Result<TopResponse, ApiError> {
        let url = self.endpoint("cg/top", &query.params())?;
        self.get_json(url).await
    }

    /// GET /cg/convert
    pub async fn convert(
        &self,
        coin_id: &str,
        vs: &str,
        amount: f64,
    ) -> Result<ConvertResponse, ApiError> {
        let url = self.endpoint(
            "cg/convert",
            &[
                ("coin_id", coin_id.to_string()),
                ("vs", vs.to_string()),
                ("amount", format_amount(amount)),
            ],
        )?;
        self.get_json(url).await
    }

    /// GET /cg/history
    pub async fn history(
        &self,
        coin_id: &str,
        vs: &str,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Result<HistoryResponse, ApiError> {
        let url = self.endpoint(
            "cg/history",
            &[
                ("coin_id", coin_id.to_string()),
                ("vs", vs.to_string()),
                ("date_from", date_from.format("%Y-%m-%d").to_string()),
                ("date_to", date_to.format("%Y-%m-%d").to_string()),
            ],
        )?;
        self.get_json(url).await
    }

    /// GET /cg/price
    pub async fn price(
        &self,
        coin_id: &str,
        vs: &str,
        include_24h_change: bool,
    ) -> Result<PriceResponse, ApiError> {
        let url = self.endpoint(
            "cg/price",
            &[
                ("coin_id", coin_id.to_string()),
                ("vs", vs.to_string()),
                ("include_24h_change", include_24h_change.to_string()),
            ],
        )?;
        self.get_json(url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        debug!("GET {}", url);

        let response = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ApiError::RequestError(format!("Request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::RequestError(format!("Failed to read response: {}", e)))?;

        let result = decode_response(status, &body);
        if let Err(e) = &result {
            warn!("GET {} failed: {}", url.path(), e);
        }
        result
    }
}

const ERROR_SNIPPET_CHARS: usize = 300;

/// Map a proxy response to its payload.
///
/// An `error` field wins over the status code; a non-JSON body is a
/// deserialization error when the status was a success.
pub(crate) fn decode_response<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> Result<T, ApiError> {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) if status.is_success() => {
            return Err(ApiError::DeserializationError(format!(
                "Not a JSON response: {}",
                e
            )))
        }
        Err(_) => return Err(ApiError::HttpError(status.as_u16(), snippet(body))),
    };

    if let Some(message) = application_error(&value) {
        return Err(ApiError::Application(message));
    }

    if !status.is_success() {
        return Err(ApiError::HttpError(status.as_u16(), snippet(body)));
    }

    serde_json::from_value(value)
        .map_err(|e| ApiError::DeserializationError(format!("Failed to parse response: {}", e)))
}

/// `error` (plus `details` when present) of an application-level failure.
/// A non-string `error` counts too, reported as its JSON text.
fn application_error(value: &Value) -> Option<String> {
    let message = match value.get("error")? {
        Value::Null | Value::Bool(false) => return None,
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    if message.is_empty() {
        return None;
    }

    let details = value
        .get("details")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|d| !d.is_empty());

    Some(match details {
        Some(details) => format!("{}: {}", message, details),
        None => message,
    })
}

fn snippet(body: &str) -> String {
    body.chars().take(ERROR_SNIPPET_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answer exactly one request and hand back its request line
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.unwrap();
            let request = String::from_utf8_lossy(&buf[..n]).to_string();

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;

            request.lines().next().unwrap_or_default().to_string()
        });

        (format!("http://{}", addr), handle)
    }

    #[test]
    fn test_endpoint_building() {
        let client = ProxyClient::new("http://127.0.0.1:8061").unwrap();
        let query = TopQuery::new("usd", 100);

        let url = client.top_csv_url(&query).unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8061/cg/top.csv?vs=usd&per_page=100&page=1"
        );

        let prefixed = ProxyClient::new("http://example.com/proxy").unwrap();
        let url = prefixed.endpoint("cg/top", &query.params()).unwrap();
        assert_eq!(url.path(), "/proxy/cg/top");
    }

    #[test]
    fn test_decode_application_error_wins() {
        let ok = decode_response::<TopResponse>(StatusCode::OK, r#"{"error":"CoinGecko returned 429","details":"slow down"}"#);
        match ok {
            Err(ApiError::Application(msg)) => assert_eq!(msg, "CoinGecko returned 429: slow down"),
            other => panic!("unexpected: {:?}", other),
        }

        let bad = decode_response::<TopResponse>(StatusCode::BAD_GATEWAY, r#"{"error":"Network error: timeout"}"#);
        assert!(matches!(bad, Err(ApiError::Application(ref m)) if m == "Network error: timeout"));
    }

    #[test]
    fn test_decode_empty_error_is_ignored() {
        let parsed = decode_response::<TopResponse>(StatusCode::OK, r#"{"items":[],"cached":true,"error":""}"#).unwrap();
        assert!(parsed.cached);
    }

    #[test]
    fn test_decode_non_string_error() {
        let object = decode_response::<TopResponse>(StatusCode::OK, r#"{"items":[],"error":{"code":429}}"#);
        assert!(matches!(object, Err(ApiError::Application(ref m)) if m == r#"{"code":429}"#));

        let number = decode_response::<TopResponse>(StatusCode::OK, r#"{"items":[],"error":503}"#);
        assert!(matches!(number, Err(ApiError::Application(ref m)) if m == "503"));

        let null = decode_response::<TopResponse>(StatusCode::OK, r#"{"items":[],"error":null}"#);
        assert!(null.is_ok());
    }

    #[test]
    fn test_decode_non_json() {
        let ok = decode_response::<TopResponse>(StatusCode::OK, "<html>oops</html>");
        assert!(matches!(ok, Err(ApiError::DeserializationError(_))));

        let bad = decode_response::<TopResponse>(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
        assert!(matches!(bad, Err(ApiError::HttpError(500, ref b)) if b == "Internal Server Error"));
    }

    #[test]
    fn test_decode_http_status_without_error_field() {
        let res = decode_response::<TopResponse>(StatusCode::UNPROCESSABLE_ENTITY, r#"{"detail":"per_page"}"#);
        assert!(matches!(res, Err(ApiError::HttpError(422, _))));
    }

    #[tokio::test]
    async fn test_convert_request_and_response() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"coin_id":"bitcoin","vs":"usd","rate":65000.12345678,"result":130000.24691356,"cached":true}"#,
        )
        .await;

        let client = ProxyClient::new(&base).unwrap();
        let resp = client.convert("bitcoin", "usd", 2.0).await.unwrap();
        assert_eq!(resp.coin_id, "bitcoin");
        assert!(resp.cached);
        assert_eq!(resp.result, 130000.24691356);

        let request_line = server.await.unwrap();
        assert_eq!(
            request_line,
            "GET /cg/convert?coin_id=bitcoin&vs=usd&amount=2 HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn test_history_request_uses_iso_dates() {
        let (base, server) = serve_once("200 OK", r#"{"points":[],"cached":false}"#).await;

        let client = ProxyClient::new(&base).unwrap();
        let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 1, 30).unwrap();
        let resp = client.history("bitcoin", "usd", from, to).await.unwrap();
        assert!(resp.points.is_empty());

        let request_line = server.await.unwrap();
        assert!(request_line.contains("/cg/history?coin_id=bitcoin&vs=usd&date_from=2024-01-01&date_to=2024-01-30"));
    }

    #[tokio::test]
    async fn test_application_error_over_http() {
        let (base, server) = serve_once("200 OK", r#"{"error":"coin_id is required"}"#).await;

        let client = ProxyClient::new(&base).unwrap();
        let err = client.price("", "usd", true).await.unwrap_err();
        assert_eq!(err.to_string(), "coin_id is required");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_proxy_is_request_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ProxyClient::new(&format!("http://{}", addr)).unwrap();
        let err = client.top(&TopQuery::new("usd", 10)).await.unwrap_err();
        assert!(matches!(err, ApiError::RequestError(_)));
    }
}
