//! Chat operation
//!
//! Validate → call upstream → either hand back the live stream or parse the
//! completion and log its usage. Shared by the REST and GraphQL entry points.

use crate::config::DeepSeekConfig;
use crate::models::{ChatLogEntry, ChatRequest};
use crate::services::client::{DeepSeekClient, UpstreamOptions};
use crate::services::history::HistoryLogger;
use crate::services::validator::validate_chat_request;
use crate::utils::error::{AppError, AppResult};
use crate::utils::logging::create_chat_log_summary;
use serde_json::Value;
use tracing::debug;

/// Whether the caller may receive a streamed response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    /// Honour the request's `stream` flag
    Allowed,
    /// Force `stream: false` upstream
    Disabled,
}

/// Result of a chat call
#[derive(Debug)]
pub enum ChatOutcome {
    /// Upstream is streaming; the body has not been read
    Stream(reqwest::Response),
    /// Parsed completion JSON, already logged
    Completed(Value),
}

/// Chat completion service
#[derive(Debug, Clone)]
pub struct ChatService {
    client: DeepSeekClient,
    history: HistoryLogger,
    defaults: DeepSeekConfig,
}

impl ChatService {
    pub fn new(client: DeepSeekClient, history: HistoryLogger, defaults: DeepSeekConfig) -> Self {
        Self {
            client,
            history,
            defaults,
        }
    }

    pub fn history(&self) -> &HistoryLogger {
        &self.history
    }

    /// Run one chat completion from a raw request body
    pub async fn send(&self, body: &Value, mode: StreamMode) -> AppResult<ChatOutcome> {
        validate_chat_request(body)?;

        let request: ChatRequest = serde_json::from_value(body.clone())
            .map_err(|e| AppError::Validation(format!("Invalid chat request: {}", e)))?;

        if let Ok(summary) = serde_json::to_string_pretty(&create_chat_log_summary(&request)) {
            debug!("📥 Chat request:\n{}", summary);
        }

        let mut options = UpstreamOptions::resolve(&request, &self.defaults);
        if mode == StreamMode::Disabled {
            options.stream = false;
        }

        let response = self.client.call(&request.messages, &options).await?;

        if options.stream {
            debug!("Passing upstream stream through for model {}", options.model);
            return Ok(ChatOutcome::Stream(response));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to parse DeepSeek response: {}", e)))?;

        let entry = ChatLogEntry::from_completion(&options.model, request.messages.len(), &data);
        self.history.log(&entry).await;

        Ok(ChatOutcome::Completed(data))
    }
}
