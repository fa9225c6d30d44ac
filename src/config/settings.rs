//! Application configuration settings
//!
//! Defines all configuration structures and loading logic

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default upstream endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";
/// Default model when the request names none
pub const DEFAULT_MODEL: &str = "deepseek-chat";
/// Default generation budget
pub const DEFAULT_MAX_TOKENS: u32 = 4000;
/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// History retention, 30 days
pub const DEFAULT_HISTORY_TTL_SECS: u64 = 30 * 24 * 60 * 60;
/// Longest accepted history entry lifetime (one year)
pub const MAX_HISTORY_TTL_SECS: u64 = 365 * 24 * 60 * 60;
/// Cloudflare REST API root
pub const DEFAULT_CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Server configuration
    pub server: ServerConfig,
    /// Upstream completion API configuration
    pub deepseek: DeepSeekConfig,
    /// Request configuration
    pub request: RequestConfig,
    /// Chat history storage configuration
    pub history: HistoryConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen host
    pub host: String,
    /// Listen port
    pub port: u16,
}

/// Upstream completion API configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct DeepSeekConfig {
    /// API key; calls are rejected when absent
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// API base URL
    pub base_url: String,
    /// Model used when the request does not name one
    pub default_model: String,
    /// max_tokens used when the request does not set one
    pub max_tokens: u32,
    /// temperature used when the request does not set one
    pub temperature: f32,
    /// Non-streaming request timeout in seconds
    pub timeout: u64,
    /// Streaming request timeout in seconds
    pub stream_timeout: u64,
}

impl fmt::Debug for DeepSeekConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeepSeekConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .field("stream_timeout", &self.stream_timeout)
            .finish()
    }
}

/// Request configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Maximum request size in bytes
    pub max_request_size: usize,
}

/// Which key-value backend keeps chat history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    None,
    Memory,
    Cloudflare,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" | "off" => Ok(StoreBackend::None),
            "memory" => Ok(StoreBackend::Memory),
            "cloudflare" => Ok(StoreBackend::Cloudflare),
            other => anyhow::bail!("Invalid KV backend: {}", other),
        }
    }
}

/// Chat history storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Selected backend
    pub backend: StoreBackend,
    /// Entry lifetime in seconds
    pub ttl_secs: u64,
    /// Workers KV connection, when the Cloudflare backend is selected
    pub cloudflare: Option<CloudflareKvConfig>,
}

impl HistoryConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Workers KV namespace connection
#[derive(Clone, Serialize, Deserialize)]
pub struct CloudflareKvConfig {
    pub account_id: String,
    pub namespace_id: String,
    #[serde(skip_serializing)]
    pub api_token: String,
    pub api_base: String,
}

impl fmt::Debug for CloudflareKvConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudflareKvConfig")
            .field("account_id", &self.account_id)
            .field("namespace_id", &self.namespace_id)
            .field("api_token", &"<redacted>")
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (text/json)
    pub format: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8787,
            },
            deepseek: DeepSeekConfig {
                api_key: None,
                base_url: DEFAULT_BASE_URL.to_string(),
                default_model: DEFAULT_MODEL.to_string(),
                max_tokens: DEFAULT_MAX_TOKENS,
                temperature: DEFAULT_TEMPERATURE,
                timeout: 60,
                stream_timeout: 300,
            },
            request: RequestConfig {
                max_request_size: 1024 * 1024,
            },
            history: HistoryConfig {
                backend: StoreBackend::None,
                ttl_secs: DEFAULT_HISTORY_TTL_SECS,
                cloudflare: None,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "text".to_string(),
            },
        }
    }
}

impl Settings {
    /// Create a new configuration instance from the environment
    pub fn new() -> Result<Self> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        let backend: StoreBackend = get_env_or_default("KV_BACKEND", "none").parse()?;
        let cloudflare = if backend == StoreBackend::Cloudflare {
            Some(CloudflareKvConfig {
                account_id: std::env::var("CLOUDFLARE_ACCOUNT_ID")
                    .context("CLOUDFLARE_ACCOUNT_ID environment variable not set")?,
                namespace_id: std::env::var("CLOUDFLARE_KV_NAMESPACE_ID")
                    .context("CLOUDFLARE_KV_NAMESPACE_ID environment variable not set")?,
                api_token: std::env::var("CLOUDFLARE_API_TOKEN")
                    .context("CLOUDFLARE_API_TOKEN environment variable not set")?,
                api_base: get_env_or_default("CLOUDFLARE_API_BASE", DEFAULT_CLOUDFLARE_API_BASE),
            })
        } else {
            None
        };

        let settings = Self {
            server: ServerConfig {
                host: get_env_or_default("SERVER_HOST", "0.0.0.0"),
                port: get_env_or_default("SERVER_PORT", "8787")
                    .parse()
                    .context("Invalid port number")?,
            },
            deepseek: DeepSeekConfig {
                api_key: std::env::var("DEEPSEEK_API_KEY")
                    .ok()
                    .map(|key| key.trim().to_string())
                    .filter(|key| !key.is_empty()),
                base_url: get_env_or_default("DEEPSEEK_BASE_URL", DEFAULT_BASE_URL),
                default_model: get_env_or_default("DEFAULT_MODEL", DEFAULT_MODEL),
                max_tokens: get_env_or_default("MAX_TOKENS", &DEFAULT_MAX_TOKENS.to_string())
                    .parse()
                    .context("Invalid MAX_TOKENS value")?,
                temperature: get_env_or_default("DEFAULT_TEMPERATURE", &DEFAULT_TEMPERATURE.to_string())
                    .parse()
                    .context("Invalid DEFAULT_TEMPERATURE value")?,
                timeout: get_env_or_default("REQUEST_TIMEOUT", "60")
                    .parse()
                    .context("Invalid timeout value")?,
                stream_timeout: get_env_or_default("STREAM_TIMEOUT", "300")
                    .parse()
                    .context("Invalid stream timeout value")?,
            },
            request: RequestConfig {
                max_request_size: get_env_or_default("MAX_REQUEST_SIZE", "1048576")
                    .parse()
                    .context("Invalid maximum request size")?,
            },
            history: HistoryConfig {
                backend,
                ttl_secs: get_env_or_default("CHAT_HISTORY_TTL", &DEFAULT_HISTORY_TTL_SECS.to_string())
                    .parse()
                    .context("Invalid CHAT_HISTORY_TTL value")?,
                cloudflare,
            },
            logging: LoggingConfig {
                level: get_env_or_default("RUST_LOG", "info"),
                format: get_env_or_default("LOG_FORMAT", "text"),
            },
        };

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration validity
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Port number cannot be 0");
        }

        if let Some(key) = &self.deepseek.api_key {
            if key.contains(char::is_whitespace) {
                anyhow::bail!("DeepSeek API key cannot contain whitespace characters");
            }
        }

        if !self.deepseek.base_url.starts_with("http") {
            anyhow::bail!("Invalid DeepSeek base URL format, should start with 'http'");
        }

        if self.deepseek.default_model.trim().is_empty() {
            anyhow::bail!("Default model cannot be empty");
        }

        if self.deepseek.max_tokens == 0 {
            anyhow::bail!("MAX_TOKENS must be greater than 0");
        }

        if self.deepseek.timeout == 0 || self.deepseek.stream_timeout == 0 {
            anyhow::bail!("Timeout values cannot be 0");
        }

        if self.request.max_request_size == 0 {
            anyhow::bail!("Maximum request size cannot be 0");
        }

        if self.history.ttl_secs == 0 {
            anyhow::bail!("CHAT_HISTORY_TTL cannot be 0");
        }

        if self.history.ttl_secs > MAX_HISTORY_TTL_SECS {
            anyhow::bail!(
                "CHAT_HISTORY_TTL cannot exceed {} seconds",
                MAX_HISTORY_TTL_SECS
            );
        }

        if self.history.backend == StoreBackend::Cloudflare && self.history.cloudflare.is_none() {
            anyhow::bail!("Cloudflare KV backend selected but not configured");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!("Invalid log level: {}", self.logging.level);
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            anyhow::bail!("Invalid log format: {}", self.logging.format);
        }

        Ok(())
    }

    /// Whether an upstream API key is configured
    pub fn has_api_key(&self) -> bool {
        self.deepseek.api_key.is_some()
    }
}

/// Get environment variable or default value
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
