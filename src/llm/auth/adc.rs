//! Vertex AI access tokens from Application Default Credentials

use gcp_auth::AuthenticationManager;

use crate::llm::core::error::LlmError;

const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Bearer tokens for Vertex AI requests
///
/// Credentials are discovered once, from `GOOGLE_APPLICATION_CREDENTIALS`,
/// the gcloud user login or the metadata server. `gcp_auth` caches the token
/// and refreshes it when it expires.
pub struct VertexAuth {
    manager: AuthenticationManager,
}

impl VertexAuth {
    pub async fn discover() -> Result<Self, LlmError> {
        let manager = AuthenticationManager::new().await.map_err(|e| {
            LlmError::AuthenticationError(format!("No usable GCP credentials: {}", e))
        })?;
        Ok(Self { manager })
    }

    /// Value for the `Authorization` header
    pub async fn authorization(&self) -> Result<String, LlmError> {
        let token = self
            .manager
            .get_token(&[CLOUD_PLATFORM_SCOPE])
            .await
            .map_err(|e| {
                LlmError::AuthenticationError(format!("Failed to get access token: {}", e))
            })?;
        Ok(bearer(token.as_str()))
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
