//! GraphQL shim handler
//!
//! Not a GraphQL engine. The operation is picked by looking for known
//! substrings in the query text, then the matching REST operation runs and
//! its result is wrapped in `{data}`. Failures become `{data: null, errors}`
//! with HTTP 400.

use crate::handlers::{chat::read_json_body, health::HealthResponse, AppState};
use crate::models::GraphqlRequest;
use crate::services::{ChatOutcome, StreamMode};
use crate::utils::error::{AppError, AppResult};
use crate::utils::response::success_response;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    response::Response,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

/// Default page size for `chatHistory`
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Largest page `chatHistory` will fetch
pub const MAX_HISTORY_LIMIT: usize = 100;

/// Schema advertised by the service listing
pub const SCHEMA_SDL: &str = r#"type Query {
  health: Health!
  chatHistory(limit: Int = 10, offset: Int = 0): [ChatLogEntry!]!
}

type Mutation {
  sendMessage(input: ChatInput!): ChatResponse!
}

input ChatInput {
  messages: [MessageInput!]!
  model: String
  max_tokens: Int
  temperature: Float
}

input MessageInput {
  role: String!
  content: String!
}

type Health {
  status: String!
  timestamp: String!
  service: String!
  version: String!
}

type ChatResponse {
  id: String!
  object: String!
  created: Int!
  model: String!
  choices: [Choice!]!
  usage: Usage
}

type Choice {
  index: Int!
  message: Message!
  finish_reason: String
}

type Message {
  role: String!
  content: String!
}

type Usage {
  prompt_tokens: Int
  completion_tokens: Int
  total_tokens: Int
}

type ChatLogEntry {
  timestamp: String!
  model: String!
  messagesCount: Int!
  tokensUsed: Usage!
  requestId: String
}
"#;

/// Operation selected from the query text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphqlOperation {
    SendMessage,
    Health,
    ChatHistory,
}

impl GraphqlOperation {
    /// Pick an operation by substring match, first match wins.
    ///
    /// Any query mentioning `health`, even inside another name, resolves to
    /// `Health` unless it is a `sendMessage` mutation.
    pub fn sniff(query: &str) -> AppResult<Self> {
        if query.contains("mutation") && query.contains("sendMessage") {
            Ok(Self::SendMessage)
        } else if query.contains("health") {
            Ok(Self::Health)
        } else if query.contains("chatHistory") {
            Ok(Self::ChatHistory)
        } else {
            Err(AppError::UnsupportedOperation)
        }
    }
}

/// Handle GraphQL requests
///
/// POST /api/graphql, POST /graphql
pub async fn handle_graphql(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    match execute(&state, body).await {
        Ok(data) => success_response(&json!({ "data": data })),
        Err(e) => e.into_graphql_response(),
    }
}

async fn execute(state: &AppState, body: Result<Bytes, BytesRejection>) -> AppResult<Value> {
    let request: GraphqlRequest = serde_json::from_value(read_json_body(body)?)?;
    let operation = GraphqlOperation::sniff(&request.query)?;
    debug!("GraphQL operation: {:?}", operation);

    match operation {
        GraphqlOperation::SendMessage => {
            let input = request.variable("input");
            match state.chat.send(&input, StreamMode::Disabled).await? {
                ChatOutcome::Completed(data) => Ok(data),
                ChatOutcome::Stream(_) => Err(AppError::Internal(
                    "streaming is not available over GraphQL".to_string(),
                )),
            }
        }
        GraphqlOperation::Health => Ok(serde_json::to_value(HealthResponse::current())?),
        GraphqlOperation::ChatHistory => {
            let limit = page_variable(&request, "limit", DEFAULT_HISTORY_LIMIT).min(MAX_HISTORY_LIMIT);
            let offset = page_variable(&request, "offset", 0);
            let entries = state.history.entries(limit, offset).await;
            Ok(serde_json::to_value(entries)?)
        }
    }
}

/// Read a non-negative integer variable, falling back to `default`
fn page_variable(request: &GraphqlRequest, name: &str, default: usize) -> usize {
    request
        .variable(name)
        .as_u64()
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_operations() {
        assert_eq!(
            GraphqlOperation::sniff("mutation Send($input: ChatInput!) { sendMessage(input: $input) { id } }").unwrap(),
            GraphqlOperation::SendMessage
        );
        assert_eq!(
            GraphqlOperation::sniff("query { health { status } }").unwrap(),
            GraphqlOperation::Health
        );
        assert_eq!(
            GraphqlOperation::sniff("query { chatHistory(limit: 5) { model } }").unwrap(),
            GraphqlOperation::ChatHistory
        );
    }

    #[test]
    fn test_sniff_health_substring_wins_over_history() {
        // field names are not parsed
        assert_eq!(
            GraphqlOperation::sniff("query { chatHistory { healthScore } }").unwrap(),
            GraphqlOperation::Health
        );
    }

    #[test]
    fn test_sniff_send_message_requires_mutation() {
        let err = GraphqlOperation::sniff("query { sendMessage }").unwrap_err();
        assert_eq!(err.to_string(), "Unsupported GraphQL operation");
    }

    #[test]
    fn test_sniff_unknown() {
        assert!(matches!(
            GraphqlOperation::sniff("{ users { id } }"),
            Err(AppError::UnsupportedOperation)
        ));
    }

    #[test]
    fn test_page_variable() {
        let request = GraphqlRequest {
            query: "query { chatHistory }".to_string(),
            variables: Some(json!({ "limit": 3, "offset": -1 })),
            operation_name: None,
        };

        assert_eq!(page_variable(&request, "limit", DEFAULT_HISTORY_LIMIT), 3);
        assert_eq!(page_variable(&request, "offset", 0), 0);
        assert_eq!(page_variable(&request, "missing", 7), 7);
    }

    #[test]
    fn test_schema_lists_operations() {
        for op in ["sendMessage", "health", "chatHistory"] {
            assert!(SCHEMA_SDL.contains(op));
        }
    }
}
