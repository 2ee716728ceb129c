//! Service configuration loaded from the environment

use std::net::SocketAddr;

use thiserror::Error;

use crate::llm::{ClaudeModel, LlmSettings};

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

/// SMTP relay settings; credentials are checked when a mail is sent
#[derive(Debug, Clone, PartialEq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub sender_email: Option<String>,
    pub sender_password: Option<String>,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            sender_email: None,
            sender_password: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub database_pool_size: usize,
    pub llm: LlmSettings,
    pub llm_max_tokens: u32,
    pub smtp: SmtpConfig,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let bind_addr = parse_or(
            "BIND_ADDR",
            get("BIND_ADDR"),
            SocketAddr::from(([0, 0, 0, 0], 8000)),
        )?;
        let database_url = required("DATABASE_URL")?;
        let database_pool_size = parse_or("DATABASE_POOL_SIZE", get("DATABASE_POOL_SIZE"), 16)?;
        let llm_max_tokens = parse_or("LLM_MAX_TOKENS", get("LLM_MAX_TOKENS"), 4096)?;

        let provider = get("LLM_PROVIDER").unwrap_or_else(|| "openai".to_string());
        let llm = match provider.to_lowercase().as_str() {
            "openai" => LlmSettings::OpenAi {
                api_key: required("OPENAI_API_KEY")?,
                base_url: get("OPENAI_BASE_URL")
                    .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
                model: get("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            },
            "claude" => {
                let model_name = get("CLAUDE_MODEL").unwrap_or_else(|| "haiku-4.5".to_string());
                let model = ClaudeModel::from_short_name(&model_name).ok_or_else(|| {
                    ConfigError::Invalid {
                        var: "CLAUDE_MODEL",
                        reason: format!("unknown model '{}'", model_name),
                    }
                })?;
                LlmSettings::Claude {
                    project_id: required("GCP_PROJECT_ID")?,
                    location: get("GCP_LOCATION").unwrap_or_else(|| "us-central1".to_string()),
                    model,
                }
            }
            other => {
                return Err(ConfigError::Invalid {
                    var: "LLM_PROVIDER",
                    reason: format!("expected 'openai' or 'claude', got '{}'", other),
                })
            }
        };

        let smtp = SmtpConfig {
            host: get("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string()),
            port: parse_or("SMTP_PORT", get("SMTP_PORT"), 587)?,
            sender_email: get("SENDER_EMAIL"),
            sender_password: get("SENDER_EMAIL_PASSWORD"),
        };

        let log_format = match get("LOG_FORMAT").as_deref() {
            None | Some("compact") => LogFormat::Compact,
            Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "LOG_FORMAT",
                    reason: format!("expected 'pretty', 'compact' or 'json', got '{}'", other),
                })
            }
        };

        Ok(Self {
            bind_addr,
            database_url,
            database_pool_size,
            llm,
            llm_max_tokens,
            smtp,
            log_format,
        })
    }
}

fn parse_or<T>(var: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
