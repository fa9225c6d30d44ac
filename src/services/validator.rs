//! Chat request validation
//!
//! Runs on the raw JSON body before any typed parsing or network call, so the
//! first violated rule decides the message the client sees.

use crate::models::Role;
use crate::utils::error::{AppError, AppResult};
use serde_json::Value;

pub const MESSAGES_REQUIRED: &str = "messages field required and must be an array";
pub const MESSAGES_EMPTY: &str = "messages array cannot be empty";
pub const MESSAGE_FIELDS_REQUIRED: &str = "each message must include role and content";
pub const INVALID_ROLE: &str = "role must be system, user, or assistant";
pub const INVALID_MAX_TOKENS: &str = "max_tokens must be a positive integer";

/// Validate an inbound chat request body
///
/// Rules, first violation wins:
/// 1. `messages` present and an array
/// 2. `messages` non-empty
/// 3. every message has a non-empty string `role` and `content`
/// 4. every `role` is system, user or assistant
/// 5. `max_tokens`, when present, is a positive integer
pub fn validate_chat_request(body: &Value) -> AppResult<()> {
    let messages = body
        .get("messages")
        .and_then(Value::as_array)
        .ok_or_else(|| AppError::Validation(MESSAGES_REQUIRED.to_string()))?;

    if messages.is_empty() {
        return Err(AppError::Validation(MESSAGES_EMPTY.to_string()));
    }

    for message in messages {
        let role = non_empty_str(message.get("role"));
        let content = non_empty_str(message.get("content"));

        let (Some(role), Some(_)) = (role, content) else {
            return Err(AppError::Validation(MESSAGE_FIELDS_REQUIRED.to_string()));
        };

        if !Role::ALL.contains(&role) {
            return Err(AppError::Validation(INVALID_ROLE.to_string()));
        }
    }

    match body.get("max_tokens") {
        None | Some(Value::Null) => {}
        Some(value) => match value.as_u64() {
            Some(n) if n > 0 && n <= u64::from(u32::MAX) => {}
            _ => return Err(AppError::Validation(INVALID_MAX_TOKENS.to_string())),
        },
    }

    Ok(())
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}
