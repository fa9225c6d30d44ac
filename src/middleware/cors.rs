//! CORS middleware
//!
//! Answers every OPTIONS request with a bare 204, whatever the path, and
//! makes sure all other responses carry the CORS headers.

use crate::utils::response::{apply_cors_headers, preflight_response};
use axum::{
    extract::Request,
    http::Method,
    middleware::Next,
    response::Response,
};
use tracing::debug;

pub async fn cors_middleware(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        debug!("CORS preflight for {}", request.uri().path());
        return preflight_response();
    }

    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut());
    response
}
