//! HTTP client service
//!
//! Encapsulates HTTP communication with the DeepSeek chat-completion API

use crate::config::DeepSeekConfig;
use crate::models::{ChatMessage, ChatRequest};
use crate::utils::error::{AppError, AppResult};
use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

const USER_AGENT: &str = concat!("deepseek-proxy/", env!("CARGO_PKG_VERSION"));

/// Per-call upstream options, request overrides merged over configured defaults
#[derive(Clone, Default, PartialEq)]
pub struct UpstreamOptions {
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub stream: bool,
    pub top_p: Option<f32>,
    pub frequency_penalty: Option<f32>,
    pub presence_penalty: Option<f32>,
    pub stop: Option<Vec<String>>,
}

impl std::fmt::Debug for UpstreamOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamOptions")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("stream", &self.stream)
            .finish_non_exhaustive()
    }
}

impl UpstreamOptions {
    /// Merge a request's overrides over the configured defaults
    ///
    /// Presence decides, not truthiness: an explicit `temperature: 0` is kept.
    pub fn resolve(request: &ChatRequest, config: &DeepSeekConfig) -> Self {
        Self {
            api_key: config.api_key.clone().filter(|key| !key.is_empty()),
            model: request
                .model
                .clone()
                .filter(|model| !model.is_empty())
                .unwrap_or_else(|| config.default_model.clone()),
            max_tokens: request.max_tokens.unwrap_or(config.max_tokens),
            temperature: request.temperature.unwrap_or(config.temperature),
            stream: request.stream.unwrap_or(false),
            top_p: request.top_p,
            frequency_penalty: request.frequency_penalty,
            presence_penalty: request.presence_penalty,
            stop: request.stop.clone(),
        }
    }
}

/// Outbound request body
///
/// Optional tuning parameters are omitted, not sent as null, when unset.
#[derive(Debug, Serialize)]
pub struct UpstreamRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub max_tokens: u32,
    pub temperature: f32,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<&'a [String]>,
}

impl<'a> UpstreamRequest<'a> {
    pub fn new(messages: &'a [ChatMessage], options: &'a UpstreamOptions) -> Self {
        Self {
            model: &options.model,
            messages,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            stream: options.stream,
            top_p: options.top_p,
            frequency_penalty: options.frequency_penalty,
            presence_penalty: options.presence_penalty,
            stop: options.stop.as_deref(),
        }
    }
}

/// Upstream error body: `{"error": {"message": "..."}}`
#[derive(Debug, Deserialize)]
struct UpstreamErrorBody {
    error: UpstreamErrorDetail,
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorDetail {
    message: Option<String>,
}

/// DeepSeek API client
#[derive(Debug, Clone)]
pub struct DeepSeekClient {
    client: Client,
    stream_client: Client,
    stream_timeout: Duration,
    base_url: String,
}

impl DeepSeekClient {
    /// Create a new client instance
    pub fn new(config: &DeepSeekConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;

        // No total timeout: a live stream runs until upstream or the client ends it
        let stream_timeout = Duration::from_secs(config.stream_timeout);
        let stream_client = Client::builder()
            .connect_timeout(stream_timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create streaming HTTP client")?;

        Ok(Self {
            client,
            stream_client,
            stream_timeout,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Full chat-completions URL
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Send a chat-completion request
    ///
    /// Returns the raw upstream response on a 2xx status; the caller decides
    /// whether to stream the body or parse it as JSON.
    pub async fn call(&self, messages: &[ChatMessage], options: &UpstreamOptions) -> AppResult<Response> {
        let api_key = options
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Configuration("API key not configured".to_string()))?;

        let body = UpstreamRequest::new(messages, options);
        debug!(
            "Sending DeepSeek chat completion request: model={}, messages={}, stream={}",
            body.model,
            messages.len(),
            body.stream
        );

        let client = if options.stream { &self.stream_client } else { &self.client };
        let mut request = client
            .post(self.completions_url())
            .bearer_auth(api_key)
            .header("Content-Type", "application/json")
            .json(&body);
        if options.stream {
            request = request.header("Accept", "text/event-stream");
        }

        // Streaming calls bound only the wait for response headers
        let sent = if options.stream {
            tokio::time::timeout(self.stream_timeout, request.send())
                .await
                .map_err(|_| {
                    error!("DeepSeek API did not start streaming within {:?}", self.stream_timeout);
                    AppError::Upstream(format!(
                        "DeepSeek API did not respond within {}s",
                        self.stream_timeout.as_secs()
                    ))
                })?
        } else {
            request.send().await
        };

        let response = sent.map_err(|e| {
            error!("DeepSeek API request failed to send: {}", e);
            AppError::Upstream(format!("Failed to reach DeepSeek API: {}", e))
        })?;

        if response.status().is_success() {
            debug!("DeepSeek API responded with {}", response.status());
            return Ok(response);
        }

        Err(Self::upstream_error(response).await)
    }

    /// Classify a non-2xx upstream response
    async fn upstream_error(response: Response) -> AppError {
        let status = response.status().as_u16();
        let error_text = response.text().await.unwrap_or_default();
        let message = extract_error_message(status, &error_text);

        error!("DeepSeek API error: {}", message);
        AppError::Upstream(message)
    }
}

/// Prefer the nested `error.message`; fall back to status and raw body
pub fn extract_error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<UpstreamErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error.message)
        .unwrap_or_else(|| format!("DeepSeek API error ({}): {}", status, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::models::Role;

    fn test_config() -> DeepSeekConfig {
        let mut config = Settings::default().deepseek;
        config.api_key = Some("sk-test".to_string());
        config
    }

    #[test]
    fn test_client_creation() {
        let client = DeepSeekClient::new(&test_config()).unwrap();
        assert_eq!(client.completions_url(), "https://api.deepseek.com/v1/chat/completions");

        let mut config = test_config();
        config.base_url = "http://localhost:9000/".to_string();
        let client = DeepSeekClient::new(&config).unwrap();
        assert_eq!(client.completions_url(), "http://localhost:9000/chat/completions");
    }

    #[test]
    fn test_resolve_defaults() {
        let request = ChatRequest {
            messages: vec![ChatMessage::new(Role::User, "hi")],
            ..Default::default()
        };

        let options = UpstreamOptions::resolve(&request, &test_config());
        assert_eq!(options.model, "deepseek-chat");
        assert_eq!(options.max_tokens, 4000);
        assert!((options.temperature - 0.7).abs() < f32::EPSILON);
        assert!(!options.stream);
        assert_eq!(options.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_resolve_overrides() {
        let request = ChatRequest {
            messages: vec![ChatMessage::new(Role::User, "hi")],
            model: Some("deepseek-reasoner".to_string()),
            max_tokens: Some(10),
            temperature: Some(0.0),
            stream: Some(true),
            ..Default::default()
        };

        let options = UpstreamOptions::resolve(&request, &test_config());
        assert_eq!(options.model, "deepseek-reasoner");
        assert_eq!(options.max_tokens, 10);
        assert_eq!(options.temperature, 0.0);
        assert!(options.stream);
    }

    #[test]
    fn test_request_body_omits_unset_parameters() {
        let messages = vec![ChatMessage::new(Role::User, "hi")];
        let options = UpstreamOptions::resolve(
            &ChatRequest {
                messages: messages.clone(),
                ..Default::default()
            },
            &test_config(),
        );

        let body = serde_json::to_value(UpstreamRequest::new(&messages, &options)).unwrap();
        assert_eq!(body["model"], "deepseek-chat");
        assert_eq!(body["max_tokens"], 4000);
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "user");
        for key in ["top_p", "frequency_penalty", "presence_penalty", "stop"] {
            assert!(body.get(key).is_none(), "{} should be omitted", key);
        }
    }

    #[test]
    fn test_request_body_includes_set_parameters() {
        let messages = vec![ChatMessage::new(Role::User, "hi")];
        let mut options = UpstreamOptions::resolve(
            &ChatRequest {
                messages: messages.clone(),
                ..Default::default()
            },
            &test_config(),
        );
        options.top_p = Some(0.5);
        options.presence_penalty = Some(1.0);
        options.stop = Some(vec!["END".to_string()]);

        let body = serde_json::to_value(UpstreamRequest::new(&messages, &options)).unwrap();
        assert_eq!(body["top_p"], 0.5);
        assert_eq!(body["presence_penalty"], 1.0);
        assert_eq!(body["stop"][0], "END");
        assert!(body.get("frequency_penalty").is_none());
    }

    #[test]
    fn test_extract_error_message() {
        assert_eq!(
            extract_error_message(429, r#"{"error":{"message":"rate limited"}}"#),
            "rate limited"
        );
        assert_eq!(extract_error_message(500, "oops"), "DeepSeek API error (500): oops");
        assert_eq!(
            extract_error_message(400, r#"{"error":{"code":"x"}}"#),
            r#"DeepSeek API error (400): {"error":{"code":"x"}}"#
        );
    }

    #[tokio::test]
    async fn test_missing_api_key_rejected_before_network() {
        let mut config = test_config();
        config.api_key = None;
        // unroutable base URL: any network attempt would surface as an Upstream error
        config.base_url = "http://127.0.0.1:1".to_string();
        let client = DeepSeekClient::new(&config).unwrap();

        let request = ChatRequest {
            messages: vec![ChatMessage::new(Role::User, "hi")],
            ..Default::default()
        };
        let options = UpstreamOptions::resolve(&request, &config);

        match client.call(&request.messages, &options).await {
            Err(AppError::Configuration(msg)) => assert_eq!(msg, "API key not configured"),
            other => panic!("expected configuration error, got {:?}", other.map(|_| ())),
        }
    }
}
