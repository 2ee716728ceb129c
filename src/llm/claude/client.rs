//! Claude client implementation

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;

use crate::llm::auth::adc::VertexAuth;
use crate::llm::core::{
    error::LlmError,
    provider::{EventStream, LlmProvider},
    types::{GenerateRequest, StreamEvent, UsageMetadata},
};
use crate::llm::sse::decode_frames;

use super::mapper::{from_claude_event, to_claude_request};
use super::types::ClaudeStreamEvent;

/// Claude model identifiers for Vertex AI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaudeModel {
    /// Claude Sonnet 4.5 (released 2025-09-29)
    Sonnet45,
    /// Claude Haiku 4.5 (released 2025-10-01)
    Haiku45,
}

impl ClaudeModel {
    /// Get the model identifier string for Vertex AI
    pub fn as_str(&self) -> &str {
        match self {
            ClaudeModel::Sonnet45 => "claude-sonnet-4-5@20250929",
            ClaudeModel::Haiku45 => "claude-haiku-4-5@20251001",
        }
    }

    /// Parse the short name used in configuration (`sonnet-4.5`, `haiku-4.5`)
    pub fn from_short_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sonnet-4.5" | "sonnet" => Some(ClaudeModel::Sonnet45),
            "haiku-4.5" | "haiku" => Some(ClaudeModel::Haiku45),
            _ => None,
        }
    }
}

/// Client for interacting with Claude models on Vertex AI
pub struct ClaudeClient {
    http_client: Client,
    auth: VertexAuth,
    project_id: String,
    location: String,
    model: ClaudeModel,
}

impl ClaudeClient {
    /// Create a new Claude client
    ///
    /// # Errors
    ///
    /// Returns an error if no Application Default Credentials can be found.
    pub async fn new(
        project_id: String,
        location: String,
        model: ClaudeModel,
    ) -> Result<Self, LlmError> {
        let http_client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .map_err(|e| LlmError::HttpError {
                status: 0,
                body: format!("Failed to create HTTP client: {}", e),
            })?;

        let auth = VertexAuth::discover().await?;

        Ok(Self {
            http_client,
            auth,
            project_id,
            location,
            model,
        })
    }

    fn build_endpoint_url(&self) -> String {
        endpoint_url(&self.project_id, &self.location, &self.model)
    }
}

fn endpoint_url(project_id: &str, location: &str, model: &ClaudeModel) -> String {
    format!(
        "https://{}-aiplatform.googleapis.com/v1/projects/{}/locations/{}/publishers/anthropic/models/{}:streamRawPredict",
        location,
        project_id,
        location,
        model.as_str()
    )
}

/// Parse one SSE `data` payload into a Claude event
fn parse_claude_event(data: &str) -> Result<ClaudeStreamEvent, LlmError> {
    serde_json::from_str(data).map_err(|e| {
        LlmError::SerializationError(format!("Failed to parse Claude event: {} ({})", e, data))
    })
}

#[async_trait]
impl LlmProvider for ClaudeClient {
    async fn stream_generate(&self, request: GenerateRequest) -> Result<EventStream, LlmError> {
        let claude_request = to_claude_request(request);
        let authorization = self.auth.authorization().await?;

        tracing::debug!(
            model = self.model.as_str(),
            messages = claude_request.messages.len(),
            "sending Claude request"
        );

        let response = self
            .http_client
            .post(self.build_endpoint_url())
            .header("Authorization", authorization)
            .header("Content-Type", "application/json")
            .json(&claude_request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::HttpError {
                status: status.as_u16(),
                body,
            });
        }

        let mut accumulated_usage = UsageMetadata::default();
        let event_stream = decode_frames(Box::pin(response.bytes_stream())).flat_map(move |frame| {
            let events: Vec<Result<StreamEvent, LlmError>> =
                match frame.and_then(|f| parse_claude_event(&f.data)) {
                    Ok(event) => from_claude_event(event, &mut accumulated_usage)
                        .into_iter()
                        .map(Ok)
                        .collect(),
                    Err(e) => vec![Err(e)],
                };
            futures::stream::iter(events)
        });

        Ok(Box::pin(event_stream))
    }

    fn name(&self) -> &str {
        "claude"
    }
}
