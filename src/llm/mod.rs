//! LLM abstraction layer
//!
//! A provider-neutral streaming interface with two backends: OpenAI Chat
//! Completions and Anthropic Claude on Vertex AI. On top of it sit the tool
//! registry and the agent loop used by the offer generator and chat.

pub mod agent;
pub mod auth;
pub mod claude;
pub mod core;
pub mod openai;
pub mod sse;
pub mod tools;

#[cfg(test)]
pub(crate) mod testing;

pub use core::{
    config::{GenerationConfig, ToolChoice},
    error::LlmError,
    provider::{create_provider, EventStream, LlmProvider, LlmSettings},
    types::{
        ContentBlock, ContentDelta, FinishReason, GenerateRequest, Message, MessageRole,
        StreamEvent, ToolDeclaration, UsageMetadata,
    },
};

pub use agent::{Agent, AgentError, AgentEvent, AgentOutcome};
pub use claude::ClaudeModel;
pub use tools::{FunctionRegistry, ToolExecutor};
