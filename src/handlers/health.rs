//! Health, stats and service listing handlers
//!
//! Provides the GET endpoints that report on the service itself

use crate::handlers::{graphql::SCHEMA_SDL, AppState};
use crate::utils::error::AppResult;
use crate::utils::response::success_response;
use crate::utils::timestamp::now_iso;
use axum::{extract::State, response::Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// Service name reported by health and listing endpoints
pub const SERVICE_NAME: &str = "DeepSeek Chat API";

/// Project documentation
pub const DOCUMENTATION_URL: &str = "https://github.com/ashenghm/cloudflare-deepseek-chat-api";

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Timestamp
    pub timestamp: String,
    /// Service name
    pub service: String,
    /// Version information
    pub version: String,
}

impl HealthResponse {
    pub fn current() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: now_iso(),
            service: SERVICE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Basic health check
///
/// GET /api/health
pub async fn health_check() -> Response {
    debug!("Executing health check");
    success_response(&HealthResponse::current())
}

/// History statistics
///
/// GET /api/stats
pub async fn stats(State(state): State<Arc<AppState>>) -> AppResult<Response> {
    let stats = state.history.stats().await?;
    debug!("Stats: {} chats recorded", stats.total_chats);
    Ok(success_response(&stats))
}

/// Service listing
///
/// GET /
pub async fn root() -> Response {
    success_response(&json!({
        "message": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "chat": "POST /api/chat",
            "health": "GET /api/health",
            "stats": "GET /api/stats",
            "graphql": "POST /api/graphql",
        },
        "documentation": DOCUMENTATION_URL,
        "schema": SCHEMA_SDL,
    }))
}
