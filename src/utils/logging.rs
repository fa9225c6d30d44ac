//! Logging utilities
//!
//! Shared logging configuration and helper functions

use crate::models::{ChatMessage, ChatRequest, Role};

/// Set to true to include full message content in debug logs
/// Default is false to reduce log verbosity
pub const VERBOSE_REQUEST_LOGGING: bool = false;

/// Truncate a string with a note about original length
pub fn truncate_content(s: &str, max_chars: usize) -> String {
    let total = s.chars().count();
    if total > max_chars {
        let head: String = s.chars().take(max_chars).collect();
        format!("{}... ({} chars truncated)", head, total - max_chars)
    } else {
        s.to_string()
    }
}

/// Create a filtered version of a chat message for logging
fn filter_message(msg: &ChatMessage) -> serde_json::Value {
    // System prompts are truncated more aggressively
    let max_len = if msg.role == Role::System { 100 } else { 200 };

    serde_json::json!({
        "role": msg.role.as_str(),
        "content": truncate_content(&msg.content, max_len),
    })
}

/// Create a filtered summary of a chat request for logging
/// Keeps original structure but truncates verbose content
pub fn create_chat_log_summary(request: &ChatRequest) -> serde_json::Value {
    if VERBOSE_REQUEST_LOGGING {
        serde_json::to_value(request).unwrap_or(serde_json::json!({"error": "serialize failed"}))
    } else {
        let filtered_messages: Vec<serde_json::Value> =
            request.messages.iter().map(filter_message).collect();

        serde_json::json!({
            "model": request.model,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "stream": request.stream,
            "messages": filtered_messages,
        })
    }
}
