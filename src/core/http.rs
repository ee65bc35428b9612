//! HTTP client utilities.
//!
//! Provides a shared HTTP client for all source fetchers.

use std::time::Duration;

use reqwest::{Client, ClientBuilder};
use serde_json::Value;

use crate::error::{Result, StatError};

/// Default timeout for HTTP requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client with a known request timeout.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Build a configured HTTP client.
    ///
    /// # Errors
    ///
    /// Returns error if client construction fails.
    pub fn new(timeout: Duration) -> Result<Self> {
        let inner = ClientBuilder::new()
            .timeout(timeout)
            .user_agent(format!("statcard/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StatError::Network(e.to_string()))?;
        Ok(Self { inner, timeout })
    }

    /// Client with [`DEFAULT_TIMEOUT`].
    ///
    /// # Errors
    ///
    /// Returns error if client construction fails.
    pub fn with_default_timeout() -> Result<Self> {
        Self::new(DEFAULT_TIMEOUT)
    }

    /// Configured request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch JSON from a URL.
    ///
    /// # Errors
    ///
    /// `Timeout` when the request exceeds the client timeout, `HttpStatus`
    /// for non-2xx answers, `Network` for other transport failures and
    /// `ParseResponse` when the body is not JSON.
    pub async fn fetch_json(&self, url: &str) -> Result<Value> {
        let response = self.inner.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                StatError::Timeout(self.timeout.as_secs())
            } else {
                StatError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(StatError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                StatError::Timeout(self.timeout.as_secs())
            } else {
                StatError::Network(e.to_string())
            }
        })?;

        serde_json::from_slice(&body).map_err(|e| StatError::ParseResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::path;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn serve(route: &str, response: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(path(route))
            .respond_with(response)
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn json_body_is_returned() {
        let server = serve("/ok", ResponseTemplate::new(200).set_body_json(serde_json::json!({ "a": 1 }))).await;
        let client = HttpClient::with_default_timeout().unwrap();
        let value = client.fetch_json(&format!("{}/ok", server.uri())).await.unwrap();
        assert_eq!(value["a"], 1);
    }

    #[tokio::test]
    async fn non_success_status_is_http_status() {
        let server = serve("/gone", ResponseTemplate::new(404)).await;
        let client = HttpClient::with_default_timeout().unwrap();
        let err = client.fetch_json(&format!("{}/gone", server.uri())).await.unwrap_err();
        assert!(matches!(err, StatError::HttpStatus { status: 404, .. }));
        assert!(err.is_fallback_eligible());
    }

    #[tokio::test]
    async fn non_json_body_is_parse_error() {
        let server = serve("/html", ResponseTemplate::new(200).set_body_string("<html>")).await;
        let client = HttpClient::with_default_timeout().unwrap();
        let err = client.fetch_json(&format!("{}/html", server.uri())).await.unwrap_err();
        assert!(matches!(err, StatError::ParseResponse(_)));
    }

    #[tokio::test]
    async fn slow_response_is_timeout() {
        let server = serve(
            "/slow",
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({}))
                .set_delay(Duration::from_millis(500)),
        )
        .await;
        let client = HttpClient::new(Duration::from_millis(50)).unwrap();
        let err = client.fetch_json(&format!("{}/slow", server.uri())).await.unwrap_err();
        assert!(matches!(err, StatError::Timeout(_)), "got {err:?}");
        assert!(err.is_fallback_eligible());
        assert_eq!(err.exit_code(), crate::error::ExitCode::Timeout);
    }
}
