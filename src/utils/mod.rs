//! Utilities module
//!
//! Contains error handling, response builders and other utility tools

pub mod error;
pub mod logging;
pub mod response;
pub mod timestamp;
