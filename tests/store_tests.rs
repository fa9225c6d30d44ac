//! Key-value store backend tests

use deepseek_proxy::config::{CloudflareKvConfig, HistoryConfig, StoreBackend};
use deepseek_proxy::store::{self, CloudflareKvStore, InMemoryKvStore, KvStore, StoreError};
use httpmock::prelude::*;
use serde_json::json;
use std::time::Duration;

const NAMESPACE_PATH: &str = "/accounts/acct-1/storage/kv/namespaces/ns-1";

fn cloudflare_store(server: &MockServer) -> CloudflareKvStore {
    CloudflareKvStore::new(CloudflareKvConfig {
        account_id: "acct-1".to_string(),
        namespace_id: "ns-1".to_string(),
        api_token: "cf-token".to_string(),
        api_base: server.base_url(),
    })
    .unwrap()
}

#[tokio::test]
async fn test_cloudflare_put_sends_ttl_and_body() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path(format!("{}/values/chat_1700000000000_abc", NAMESPACE_PATH))
                .query_param("expiration_ttl", "2592000")
                .header("authorization", "Bearer cf-token")
                .body(r#"{"model":"deepseek-chat"}"#);
            then.status(200)
                .json_body(json!({"success": true, "errors": [], "messages": [], "result": null}));
        })
        .await;

    let store = cloudflare_store(&server);
    store
        .put(
            "chat_1700000000000_abc",
            r#"{"model":"deepseek-chat"}"#.to_string(),
            Some(Duration::from_secs(2_592_000)),
        )
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_cloudflare_put_failure_reports_api_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(PUT);
            then.status(403).json_body(json!({
                "success": false,
                "errors": [{"code": 10000, "message": "Authentication error"}],
                "result": null
            }));
        })
        .await;

    let store = cloudflare_store(&server);
    let err = store.put("chat_1", "{}".to_string(), None).await.unwrap_err();

    assert!(matches!(err, StoreError::Backend(_)));
    assert!(err.to_string().contains("Authentication error"));
}

#[tokio::test]
async fn test_cloudflare_get_value_and_missing() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(format!("{}/values/present", NAMESPACE_PATH));
            then.status(200).body(r#"{"model":"deepseek-chat"}"#);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(format!("{}/values/absent", NAMESPACE_PATH));
            then.status(404).json_body(json!({
                "success": false,
                "errors": [{"code": 10009, "message": "get: 'key not found'"}]
            }));
        })
        .await;

    let store = cloudflare_store(&server);
    assert_eq!(
        store.get("present").await.unwrap().as_deref(),
        Some(r#"{"model":"deepseek-chat"}"#)
    );
    assert_eq!(store.get("absent").await.unwrap(), None);
}

#[tokio::test]
async fn test_cloudflare_list_sorts_and_truncates() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(format!("{}/keys", NAMESPACE_PATH))
                .query_param("prefix", "chat_")
                .query_param("limit", "10");
            then.status(200).json_body(json!({
                "success": true,
                "errors": [],
                "result": [
                    {"name": "chat_3"},
                    {"name": "chat_1"},
                    {"name": "chat_2"}
                ],
                "result_info": {"count": 3, "cursor": ""}
            }));
        })
        .await;

    let store = cloudflare_store(&server);
    let keys = store.list("chat_", 2).await.unwrap();

    assert_eq!(keys, vec!["chat_1".to_string(), "chat_2".to_string()]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_memory_store_contract() {
    let store = InMemoryKvStore::new();
    assert_eq!(store.name(), "memory");

    store.put("chat_2", "b".to_string(), None).await.unwrap();
    store.put("chat_1", "a".to_string(), None).await.unwrap();
    store.put("misc", "c".to_string(), None).await.unwrap();

    assert_eq!(store.list("chat_", 10).await.unwrap(), vec!["chat_1", "chat_2"]);
    assert_eq!(store.get("chat_1").await.unwrap().as_deref(), Some("a"));
    assert_eq!(store.get("nope").await.unwrap(), None);
}

#[test]
fn test_from_settings_backends() {
    let none = HistoryConfig {
        backend: StoreBackend::None,
        ttl_secs: 60,
        cloudflare: None,
    };
    assert!(store::from_settings(&none).unwrap().is_none());

    let memory = HistoryConfig {
        backend: StoreBackend::Memory,
        ..none.clone()
    };
    assert_eq!(store::from_settings(&memory).unwrap().unwrap().name(), "memory");

    let cloudflare_missing = HistoryConfig {
        backend: StoreBackend::Cloudflare,
        ..none
    };
    assert!(store::from_settings(&cloudflare_missing).is_err());
}
