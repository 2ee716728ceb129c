//! Claude provider implementation
//!
//! Client for Anthropic Claude models hosted on Google Cloud Platform's
//! Vertex AI, authenticated through Application Default Credentials.

pub mod client;
pub mod mapper;
pub mod types;

pub use client::{ClaudeClient, ClaudeModel};
