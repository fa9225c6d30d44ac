//! HTTP handlers module
//!
//! Contains all HTTP endpoint handling logic

pub mod chat;
pub mod graphql;
pub mod health;

use crate::config::Settings;
use crate::middleware::{cors_middleware, request_logging_middleware};
use crate::services::{ChatService, DeepSeekClient, HistoryLogger};
use crate::store::KvStore;
use crate::utils::error::AppError;
use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub settings: Settings,
    pub chat: ChatService,
    pub history: HistoryLogger,
}

impl AppState {
    /// Wire the services from settings and an optional history store
    pub fn new(settings: Settings, store: Option<Arc<dyn KvStore>>) -> Result<Self> {
        let client = DeepSeekClient::new(&settings.deepseek)?;
        let history = HistoryLogger::new(store, settings.history.ttl());
        let chat = ChatService::new(client, history.clone(), settings.deepseek.clone());

        Ok(Self {
            settings,
            chat,
            history,
        })
    }
}

/// Create application router
pub async fn create_router(settings: Settings, store: Option<Arc<dyn KvStore>>) -> Result<Router> {
    let max_request_size = settings.request.max_request_size;

    if !settings.has_api_key() {
        tracing::warn!("DEEPSEEK_API_KEY not set, chat requests will be rejected");
    }

    let app_state = Arc::new(AppState::new(settings, store)?);
    info!(
        "Router initialized (history {})",
        if app_state.history.is_enabled() { "enabled" } else { "disabled" }
    );

    // Create middleware stack
    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(cors_middleware))
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(DefaultBodyLimit::max(max_request_size));

    // Create routes
    let router = Router::new()
        .route("/", get(health::root).fallback(method_not_allowed))
        .route("/api/chat", post(chat::handle_chat).fallback(method_not_allowed))
        .route("/api/health", get(health::health_check).fallback(method_not_allowed))
        .route("/api/stats", get(health::stats).fallback(method_not_allowed))
        .route("/api/graphql", post(graphql::handle_graphql).fallback(method_not_allowed))
        .route("/graphql", post(graphql::handle_graphql).fallback(method_not_allowed))
        .fallback(not_found)
        .with_state(app_state)
        .layer(middleware_stack);

    Ok(router)
}

async fn not_found() -> AppError {
    AppError::NotFound
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
