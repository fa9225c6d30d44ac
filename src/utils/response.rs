//! Response builders
//!
//! Every response leaving the gateway carries the same CORS headers

use axum::{
    body::Body,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, CACHE_CONTROL, CONNECTION,
            CONTENT_TYPE,
        },
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization";
pub const MAX_AGE: &str = "86400";

/// Insert the CORS headers, replacing any existing values
pub fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static(ALLOW_ORIGIN));
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS));
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS));
    headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(MAX_AGE));
}

/// JSON response with the given status
pub fn json_response<T: Serialize>(data: &T, status: StatusCode) -> Response {
    let mut response = (status, Json(data)).into_response();
    apply_cors_headers(response.headers_mut());
    response
}

/// 200 JSON response
pub fn success_response<T: Serialize>(data: &T) -> Response {
    json_response(data, StatusCode::OK)
}

/// REST error envelope response
pub fn error_response<T: Serialize>(envelope: &T, status: StatusCode) -> Response {
    json_response(envelope, status)
}

/// GraphQL error envelope response, always 400
pub fn graphql_error_response<T: Serialize>(envelope: &T) -> Response {
    json_response(envelope, StatusCode::BAD_REQUEST)
}

/// CORS preflight response: 204, headers only
pub fn preflight_response() -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::NO_CONTENT;
    apply_cors_headers(response.headers_mut());
    response
}

/// Server-sent events passthrough response
pub fn event_stream_response(body: Body) -> Response {
    let mut response = Response::new(body);
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    apply_cors_headers(headers);
    response
}
