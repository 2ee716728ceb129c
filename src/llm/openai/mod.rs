//! OpenAI provider implementation
//!
//! Streams from the Chat Completions API. Any endpoint speaking the same
//! protocol (Azure OpenAI, vLLM, Ollama's compatibility layer) works by
//! pointing the base URL at it.

pub mod client;
pub mod mapper;
pub mod types;

pub use client::OpenAiClient;
