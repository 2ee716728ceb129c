//! OpenAI client implementation

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;

use crate::llm::core::{
    error::LlmError,
    provider::{EventStream, LlmProvider},
    types::{GenerateRequest, StreamEvent},
};
use crate::llm::sse::decode_frames;

use super::mapper::{to_openai_request, ChunkMapper};
use super::types::ChatCompletionChunk;

/// Client for the OpenAI Chat Completions streaming API
pub struct OpenAiClient {
    http_client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    /// Create a new OpenAI client
    ///
    /// No request is made until the first generation.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is empty or the HTTP client cannot be built.
    pub fn new(api_key: String, base_url: String, model: String) -> Result<Self, LlmError> {
        if api_key.trim().is_empty() {
            return Err(LlmError::AuthenticationError(
                "OpenAI API key is empty".to_string(),
            ));
        }

        let http_client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .map_err(|e| LlmError::HttpError {
                status: 0,
                body: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http_client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    fn build_endpoint_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// Decode one SSE `data` payload
///
/// Returns `None` for the `[DONE]` sentinel.
fn parse_chunk(data: &str) -> Result<Option<ChatCompletionChunk>, LlmError> {
    if data.trim() == "[DONE]" {
        return Ok(None);
    }
    serde_json::from_str(data).map(Some).map_err(|e| {
        LlmError::SerializationError(format!("Failed to parse OpenAI chunk: {} ({})", e, data))
    })
}

#[async_trait]
impl LlmProvider for OpenAiClient {
    async fn stream_generate(&self, request: GenerateRequest) -> Result<EventStream, LlmError> {
        let openai_request = to_openai_request(request, &self.model);

        tracing::debug!(
            model = %self.model,
            messages = openai_request.messages.len(),
            tools = openai_request.tools.as_ref().map_or(0, |t| t.len()),
            "sending OpenAI request"
        );

        let response = self
            .http_client
            .post(self.build_endpoint_url())
            .bearer_auth(&self.api_key)
            .json(&openai_request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(if status.as_u16() == 401 {
                LlmError::AuthenticationError(body)
            } else {
                LlmError::HttpError {
                    status: status.as_u16(),
                    body,
                }
            });
        }

        let mut mapper = ChunkMapper::new();
        let event_stream = decode_frames(Box::pin(response.bytes_stream())).flat_map(move |frame| {
            let events: Vec<Result<StreamEvent, LlmError>> =
                match frame.and_then(|f| parse_chunk(&f.data)) {
                    Ok(Some(chunk)) => match mapper.map_chunk(chunk) {
                        Ok(events) => events.into_iter().map(Ok).collect(),
                        Err(e) => vec![Err(e)],
                    },
                    Ok(None) => mapper.finish().into_iter().map(Ok).collect(),
                    Err(e) => vec![Err(e)],
                };
            futures::stream::iter(events)
        });

        Ok(Box::pin(event_stream))
    }

    fn name(&self) -> &str {
        "openai"
    }
}
