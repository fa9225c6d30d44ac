//! Error handling module tests

use axum::http::StatusCode;
use axum::response::IntoResponse;
use deepseek_proxy::store::StoreError;
use deepseek_proxy::utils::error::*;

#[test]
fn test_app_error_status_codes() {
    let test_cases = vec![
        (AppError::Validation("test".to_string()), StatusCode::BAD_REQUEST),
        (AppError::Configuration("test".to_string()), StatusCode::BAD_REQUEST),
        (AppError::Upstream("test".to_string()), StatusCode::BAD_REQUEST),
        (AppError::UnsupportedOperation, StatusCode::BAD_REQUEST),
        (AppError::PayloadTooLarge, StatusCode::PAYLOAD_TOO_LARGE),
        (AppError::NotFound, StatusCode::NOT_FOUND),
        (AppError::MethodNotAllowed, StatusCode::METHOD_NOT_ALLOWED),
        (AppError::StorageUnavailable, StatusCode::SERVICE_UNAVAILABLE),
        (
            AppError::Storage(StoreError::Backend("down".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
        (AppError::Internal("test".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
    ];

    for (error, expected_status) in test_cases {
        assert_eq!(error.status_code(), expected_status);
    }
}

#[test]
fn test_json_error_converts_to_bad_request() {
    let parse_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let error: AppError = parse_error.into();

    assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    assert!(error.to_string().starts_with("Invalid JSON body"));
}

#[test]
fn test_storage_error_text_is_embedded() {
    let error: AppError = StoreError::Backend("namespace missing".to_string()).into();
    let envelope = error.to_error_response();

    assert_eq!(envelope.error, "KV storage error: namespace missing");
}

#[tokio::test]
async fn test_rest_error_response() {
    let response = AppError::Upstream("rate limited".to_string()).into_response();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "rate limited");
    assert!(json["timestamp"].as_str().unwrap().ends_with('Z'));
    assert_eq!(json.as_object().unwrap().len(), 2);
}

#[tokio::test]
async fn test_graphql_error_response() {
    let response = AppError::UnsupportedOperation.into_graphql_response();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(json["data"].is_null());
    assert_eq!(json["errors"][0]["message"], "Unsupported GraphQL operation");
}

#[test]
fn test_error_serialization() {
    let error_response = ErrorResponse {
        error: "Test error".to_string(),
        timestamp: "2024-01-01T00:00:00.000Z".to_string(),
    };

    let json = serde_json::to_string(&error_response).unwrap();
    let deserialized: ErrorResponse = serde_json::from_str(&json).unwrap();

    assert_eq!(deserialized.error, "Test error");
    assert_eq!(deserialized.timestamp, "2024-01-01T00:00:00.000Z");
}
