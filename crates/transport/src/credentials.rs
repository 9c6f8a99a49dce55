//! Ephemeral-credential exchange
//!
//! One authenticated HTTP call against the worker backend. The response body
//! either carries a `data` object with the client secret or an `error`
//! string; absence of `data` is a hard connect failure, and the failure is
//! terminal for the session instance.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use roots_core::{CredentialProvider, EphemeralCredential, Error, Result};

/// Path of the credential endpoint on the worker backend
const EPHEMERAL_KEY_PATH: &str = "/api/ephemeral-key";

#[derive(Debug, Deserialize)]
struct WorkerApiResponse {
    data: Option<CredentialData>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CredentialData {
    value: String,
    expires_at: i64,
}

/// Credential provider backed by the worker's HTTP endpoint
pub struct HttpCredentialProvider {
    client: reqwest::Client,
    url: String,
}

impl HttpCredentialProvider {
    /// `base_url` is the worker origin, e.g. `https://roots.example.org`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Credential(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: format!("{}{}", base_url.trim_end_matches('/'), EPHEMERAL_KEY_PATH),
        })
    }
}

#[async_trait]
impl CredentialProvider for HttpCredentialProvider {
    async fn fetch(&self) -> Result<EphemeralCredential> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::Credential(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Credential(format!(
                "endpoint returned {}: {}",
                status, body
            )));
        }

        let result: WorkerApiResponse = response
            .json()
            .await
            .map_err(|e| Error::Credential(format!("malformed response: {}", e)))?;

        if let Some(message) = result.error {
            return Err(Error::Credential(message));
        }
        let data = result
            .data
            .ok_or_else(|| Error::Credential("No data in response".to_string()))?;

        tracing::debug!(expires_at = data.expires_at, "Fetched ephemeral credential");

        Ok(EphemeralCredential::new(data.value, data.expires_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn provider_for(server: &MockServer) -> HttpCredentialProvider {
        HttpCredentialProvider::new(&server.uri(), Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/ephemeral-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "value": "ek_test_123",
                    "expires_at": 1_999_999_999i64,
                    "session": { "type": "realtime" },
                }
            })))
            .mount(&server)
            .await;

        let credential = provider_for(&server).await.fetch().await.unwrap();
        assert_eq!(credential.value, "ek_test_123");
        assert_eq!(credential.expires_at, 1_999_999_999);
    }

    #[tokio::test]
    async fn test_error_field_is_a_hard_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/ephemeral-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "error": "upstream quota exceeded" })),
            )
            .mount(&server)
            .await;

        let err = provider_for(&server).await.fetch().await.unwrap_err();
        assert!(matches!(err, Error::Credential(ref m) if m.contains("quota")));
    }

    #[tokio::test]
    async fn test_missing_data_is_a_hard_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/ephemeral-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let err = provider_for(&server).await.fetch().await.unwrap_err();
        assert!(matches!(err, Error::Credential(ref m) if m.contains("No data")));
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/ephemeral-key"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = provider_for(&server).await.fetch().await.unwrap_err();
        assert!(matches!(err, Error::Credential(ref m) if m.contains("500")));
    }

    #[tokio::test]
    async fn test_non_json_body_is_a_hard_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/ephemeral-key"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
            .mount(&server)
            .await;

        let err = provider_for(&server).await.fetch().await.unwrap_err();
        assert!(matches!(err, Error::Credential(ref m) if m.contains("malformed")));
    }
}
