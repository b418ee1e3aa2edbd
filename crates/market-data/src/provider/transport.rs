//! HTTP transport seam.
//!
//! Providers only describe requests; the transport performs them. The
//! production transport wraps a shared `reqwest` client, tests substitute an
//! in-memory one.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::errors::MarketDataError;

use super::capabilities::AuthStyle;

/// A GET request against a provider API.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, key: &str, value: impl ToString) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }

    /// Attach a credential the way the provider expects it.
    pub fn authorize(self, auth: AuthStyle, api_key: Option<&str>) -> Self {
        match (auth, api_key) {
            (AuthStyle::Header(name), Some(key)) => self.header(name, key),
            (AuthStyle::Bearer, Some(key)) => self.header("Authorization", format!("Bearer {}", key)),
            (AuthStyle::QueryParam(name), Some(key)) => self.query(name, key),
            _ => self,
        }
    }

    /// Query value by key, used by tests and logging.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Performs provider requests and returns the decoded JSON body.
///
/// Implementations map every transport or status failure to
/// [`MarketDataError::ProviderRequest`] so the aggregation loop can fall back.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get_json(&self, provider: &str, request: &HttpRequest) -> Result<Value, MarketDataError>;
}

/// `reqwest`-backed transport with a per-call timeout.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Fails with `Configuration` when the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, MarketDataError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("quotehub/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MarketDataError::Configuration {
                provider: "http".to_string(),
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get_json(&self, provider: &str, request: &HttpRequest) -> Result<Value, MarketDataError> {
        let mut builder = self.client.get(&request.url).query(&request.query);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        debug!(
            "{} request: {} with {} params",
            provider,
            request.url,
            request.query.len()
        );

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                MarketDataError::request(provider, "request timed out")
            } else {
                MarketDataError::request(provider, format!("request failed: {}", e))
            }
        })?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::FORBIDDEN {
            return Err(MarketDataError::request(
                provider,
                format!("rate limited (HTTP {})", status.as_u16()),
            ));
        }

        if status == StatusCode::UNAUTHORIZED {
            return Err(MarketDataError::request(provider, "invalid or missing API key"));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(200).collect();
            return Err(MarketDataError::request(
                provider,
                format!("HTTP {} - {}", status.as_u16(), body),
            ));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| MarketDataError::request(provider, format!("failed to decode body: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_header() {
        let request = HttpRequest::get("https://finnhub.io/api/v1/quote")
            .authorize(AuthStyle::Header("X-Finnhub-Token"), Some("secret"));
        assert_eq!(
            request.headers,
            vec![("X-Finnhub-Token".to_string(), "secret".to_string())]
        );
    }

    #[test]
    fn test_authorize_bearer_and_query() {
        let request = HttpRequest::get("u").authorize(AuthStyle::Bearer, Some("tok"));
        assert_eq!(request.headers[0].1, "Bearer tok");

        let request = HttpRequest::get("u").authorize(AuthStyle::QueryParam("apikey"), Some("k"));
        assert_eq!(request.query_value("apikey"), Some("k"));
    }

    #[test]
    fn test_authorize_without_key_is_noop() {
        let request = HttpRequest::get("u").authorize(AuthStyle::Bearer, None);
        assert!(request.headers.is_empty());
    }

    mod reqwest_transport {
        use std::net::SocketAddr;

        use axum::{http::StatusCode, routing::get, Json, Router};
        use serde_json::json;

        use super::*;

        async fn upstream() -> SocketAddr {
            let app = Router::new()
                .route("/ok", get(|| async { Json(json!({"lastPrice": "1.5"})) }))
                .route("/echo", get(|headers: axum::http::HeaderMap| async move {
                    let token = headers
                        .get("X-Token")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    Json(json!({"token": token}))
                }))
                .route("/throttled", get(|| async { StatusCode::TOO_MANY_REQUESTS }))
                .route("/forbidden", get(|| async { StatusCode::FORBIDDEN }))
                .route("/unauthorized", get(|| async { StatusCode::UNAUTHORIZED }))
                .route(
                    "/broken",
                    get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded") }),
                )
                .route("/html", get(|| async { "<html>maintenance</html>" }))
                .route(
                    "/slow",
                    get(|| async {
                        tokio::time::sleep(Duration::from_secs(5)).await;
                        "late"
                    }),
                );

            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });
            addr
        }

        async fn fetch(transport: &ReqwestTransport, addr: SocketAddr, path: &str) -> Result<Value, MarketDataError> {
            let request = HttpRequest::get(format!("http://{}{}", addr, path));
            transport.get_json("BINANCE", &request).await
        }

        fn message(result: Result<Value, MarketDataError>) -> String {
            match result {
                Err(MarketDataError::ProviderRequest { provider, message }) => {
                    assert_eq!(provider, "BINANCE");
                    message
                }
                other => panic!("expected a request error, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn test_success_and_headers() {
            let addr = upstream().await;
            let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();

            let body = fetch(&transport, addr, "/ok").await.unwrap();
            assert_eq!(body["lastPrice"], "1.5");

            let request = HttpRequest::get(format!("http://{}/echo", addr)).header("X-Token", "abc");
            let body = transport.get_json("BINANCE", &request).await.unwrap();
            assert_eq!(body["token"], "abc");
        }

        #[tokio::test]
        async fn test_status_mapping() {
            let addr = upstream().await;
            let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();

            assert_eq!(
                message(fetch(&transport, addr, "/throttled").await),
                "rate limited (HTTP 429)"
            );
            assert_eq!(
                message(fetch(&transport, addr, "/forbidden").await),
                "rate limited (HTTP 403)"
            );
            assert_eq!(
                message(fetch(&transport, addr, "/unauthorized").await),
                "invalid or missing API key"
            );
            assert_eq!(
                message(fetch(&transport, addr, "/broken").await),
                "HTTP 500 - upstream exploded"
            );
            assert!(message(fetch(&transport, addr, "/html").await).starts_with("failed to decode body"));
        }

        #[tokio::test]
        async fn test_timeout_is_a_request_error() {
            let addr = upstream().await;
            let transport = ReqwestTransport::new(Duration::from_millis(100)).unwrap();

            let error = fetch(&transport, addr, "/slow").await.unwrap_err();
            assert_eq!(error.retry_class(), crate::errors::RetryClass::NextProvider);
            assert_eq!(message(Err(error)), "request timed out");
        }
    }
}
