//! Service layer module
//!
//! Contains request validation, the upstream HTTP client, history logging and
//! the chat operation that composes them

pub mod chat;
pub mod client;
pub mod history;
pub mod validator;

pub use chat::{ChatOutcome, ChatService, StreamMode};
pub use client::{DeepSeekClient, UpstreamOptions};
pub use history::{HistoryLogger, HistoryStats};
pub use validator::validate_chat_request;
