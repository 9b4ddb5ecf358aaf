use async_trait::async_trait;
use fleetbridge_application::AuthGateway;
use fleetbridge_core::{AppError, AppResult};
use fleetbridge_domain::UserId;
use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize)]
struct VerifyTokenResponse {
    subject: String,
}

/// HTTP adapter for the external auth provider's token verification endpoint.
pub struct HttpAuthGateway {
    http_client: reqwest::Client,
    verify_url: Url,
    api_key: String,
}

impl HttpAuthGateway {
    /// Creates a new gateway against a provider verification URL.
    #[must_use]
    pub fn new(http_client: reqwest::Client, verify_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            verify_url,
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl AuthGateway for HttpAuthGateway {
    async fn verify_token(&self, token: &str) -> AppResult<Option<UserId>> {
        let response = self
            .http_client
            .post(self.verify_url.clone())
            .header("X-Api-Key", self.api_key.as_str())
            .json(&serde_json::json!({ "token": token }))
            .send()
            .await
            .map_err(|error| {
                AppError::Internal(format!("auth provider request failed: {error}"))
            })?;

        // The provider answers 401 for tokens it does not recognize.
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Ok(None);
        }

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Internal(format!(
                "auth provider returned status {status}"
            )));
        }

        let verified = response.json::<VerifyTokenResponse>().await.map_err(|error| {
            AppError::Internal(format!("malformed auth provider response: {error}"))
        })?;

        Ok(Some(UserId::new(verified.subject)?))
    }
}
