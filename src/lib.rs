//! DeepSeek Chat Proxy Library
//!
//! Edge gateway in front of the DeepSeek chat-completion API: request
//! validation, streaming passthrough, a GraphQL shim and usage history

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

// Re-export common types
pub use config::Settings;
pub use handlers::{create_router, AppState};
pub use models::{ChatLogEntry, ChatMessage, ChatRequest, GraphqlRequest};
pub use services::{ChatService, DeepSeekClient, HistoryLogger};
pub use store::{InMemoryKvStore, KvStore};
pub use utils::error::{AppError, AppResult};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Library description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get version information
pub fn version_info() -> String {
    format!("{} v{} - {}", NAME, VERSION, DESCRIPTION)
}
