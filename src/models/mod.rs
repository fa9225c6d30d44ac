//! Data models module
//!
//! Defines request and record data structures for the chat gateway

pub mod chat;
pub mod graphql;

pub use chat::{ChatLogEntry, ChatMessage, ChatRequest, Role, Usage};
pub use graphql::GraphqlRequest;
