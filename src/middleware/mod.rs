//! Middleware module
//!
//! CORS handling and request logging

pub mod cors;
pub mod logging;

pub use cors::cors_middleware;
pub use logging::request_logging_middleware;
