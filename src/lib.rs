// HTTP server modules
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod state;

// Offer generation, chat and mail
pub mod chat;
pub mod email;
pub mod generator;

// Persistence
pub mod store;

// LLM abstraction layer
pub mod llm;

pub mod config;
