//! Provider trait for LLM implementations

use async_trait::async_trait;
use futures::stream::Stream;
use std::pin::Pin;
use std::sync::Arc;

use super::{
    error::LlmError,
    types::{GenerateRequest, StreamEvent},
};
use crate::llm::claude::{ClaudeClient, ClaudeModel};
use crate::llm::openai::OpenAiClient;

/// Boxed stream of provider events
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send>>;

/// Main interface that all LLM provider implementations must satisfy
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Stream generate content from the LLM
    ///
    /// Sends the request and returns a stream of events representing the
    /// incremental response. Every provider finishes a successful stream
    /// with `StreamEvent::MessageEnd`.
    async fn stream_generate(&self, request: GenerateRequest) -> Result<EventStream, LlmError>;

    /// Short provider name used in logs
    fn name(&self) -> &str;
}

/// Which hosted model answers generation requests
#[derive(Debug, Clone)]
pub enum LlmSettings {
    /// OpenAI (or any Chat Completions compatible endpoint)
    OpenAi {
        api_key: String,
        base_url: String,
        model: String,
    },
    /// Anthropic Claude hosted on Vertex AI
    Claude {
        project_id: String,
        location: String,
        model: ClaudeModel,
    },
}

impl LlmSettings {
    /// Model identifier as sent to the provider
    pub fn model_id(&self) -> &str {
        match self {
            LlmSettings::OpenAi { model, .. } => model,
            LlmSettings::Claude { model, .. } => model.as_str(),
        }
    }
}

/// Create an LLM provider from settings
///
/// # Example
///
/// ```rust,no_run
/// use offerforge::llm::{create_provider, LlmSettings};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = create_provider(&LlmSettings::OpenAi {
///     api_key: "sk-...".to_string(),
///     base_url: "https://api.openai.com/v1".to_string(),
///     model: "gpt-4o-mini".to_string(),
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn create_provider(settings: &LlmSettings) -> Result<Arc<dyn LlmProvider>, LlmError> {
    match settings {
        LlmSettings::OpenAi {
            api_key,
            base_url,
            model,
        } => {
            let client = OpenAiClient::new(api_key.clone(), base_url.clone(), model.clone())?;
            Ok(Arc::new(client))
        }
        LlmSettings::Claude {
            project_id,
            location,
            model,
        } => {
            let client =
                ClaudeClient::new(project_id.clone(), location.clone(), model.clone()).await?;
            Ok(Arc::new(client))
        }
    }
}
