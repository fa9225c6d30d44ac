//! Chat completion handler
//!
//! POST /api/chat: validates the body, calls DeepSeek and either relays the
//! event stream untouched or returns the completion JSON

use crate::handlers::AppState;
use crate::services::{ChatOutcome, StreamMode};
use crate::utils::error::{AppError, AppResult};
use crate::utils::response::{event_stream_response, success_response};
use axum::{
    body::{Body, Bytes},
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Handle chat requests
///
/// POST /api/chat
pub async fn handle_chat(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    match process_chat(&state, body).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

async fn process_chat(
    state: &AppState,
    body: Result<Bytes, BytesRejection>,
) -> AppResult<Response> {
    let body = read_json_body(body)?;

    match state.chat.send(&body, StreamMode::Allowed).await? {
        ChatOutcome::Stream(upstream) => {
            debug!("Starting streaming response transmission");
            Ok(event_stream_response(Body::from_stream(upstream.bytes_stream())))
        }
        ChatOutcome::Completed(data) => Ok(success_response(&data)),
    }
}

/// Read a request body as JSON
pub(crate) fn read_json_body(body: Result<Bytes, BytesRejection>) -> AppResult<Value> {
    let bytes = body.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge
        } else {
            AppError::Validation(e.body_text())
        }
    })?;
    Ok(serde_json::from_slice(&bytes)?)
}
