//! # Flash Flows
//!
//! End-to-end behaviour of the relay over real HTTP:
//!
//! 1. **Enqueue → Drain**: messages come back once, oldest first
//! 2. **Identity isolation**: one caller never sees another's queue
//! 3. **Rejections**: missing credential, bad body, oversized body
//! 4. **Retention**: unread messages expire
//! 5. **Lifecycle**: health checks and graceful shutdown

#[cfg(test)]
mod tests {
    use crate::harness::{spawn_relay, token_for};
    use flash_relay::{FlashMessage, Identity, MemoryFlashStore, RelayConfig, RetryPolicy};
    use reqwest::{Client, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn memory_store(retention: Duration) -> Arc<MemoryFlashStore> {
        Arc::new(MemoryFlashStore::new(retention, RetryPolicy::default()))
    }

    async fn drain(client: &Client, url: &str, token: &str) -> Vec<FlashMessage> {
        let response = client.get(url).bearer_auth(token).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        response.json().await.unwrap()
    }

    async fn post(client: &Client, url: &str, token: &str, body: &Value) -> StatusCode {
        client
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .unwrap()
            .status()
    }

    // =============================================================================
    // ENQUEUE → DRAIN
    // =============================================================================

    #[tokio::test]
    async fn test_messages_are_delivered_once_in_order() {
        let relay = spawn_relay(RelayConfig::default(), memory_store(Duration::from_secs(60))).await;
        let client = Client::new();
        let url = relay.flash_url();
        let token = token_for("alice");

        let status = post(
            &client,
            &url,
            &token,
            &json!([
                {"type": "info", "content": "Profile saved"},
                {"type": "warning", "content": "Password expires soon"}
            ]),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let status = post(
            &client,
            &url,
            &token,
            &json!([{"type": "error", "content": "Upload failed"}]),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let drained = drain(&client, &url, &token).await;
        assert_eq!(
            drained,
            vec![
                FlashMessage::new("info", "Profile saved"),
                FlashMessage::new("warning", "Password expires soon"),
                FlashMessage::new("error", "Upload failed"),
            ]
        );

        assert!(drain(&client, &url, &token).await.is_empty());
        relay.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_content_survives_unicode_and_newlines() {
        let relay = spawn_relay(RelayConfig::default(), memory_store(Duration::from_secs(60))).await;
        let client = Client::new();
        let url = relay.flash_url();
        let token = token_for("alice");

        let body = json!([{"type": "info", "content": "line one\nline two ✓ «ok»"}]);
        assert_eq!(post(&client, &url, &token, &body).await, StatusCode::NO_CONTENT);

        let drained = drain(&client, &url, &token).await;
        assert_eq!(drained, vec![FlashMessage::new("info", "line one\nline two ✓ «ok»")]);
        relay.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_identities_are_isolated() {
        let relay = spawn_relay(RelayConfig::default(), memory_store(Duration::from_secs(60))).await;
        let client = Client::new();
        let url = relay.flash_url();
        let alice = token_for("alice");
        let bob = token_for("bob");

        post(&client, &url, &alice, &json!([{"type": "info", "content": "a"}])).await;
        post(&client, &url, &bob, &json!([{"type": "info", "content": "b"}])).await;

        assert_eq!(drain(&client, &url, &bob).await, vec![FlashMessage::new("info", "b")]);
        assert_eq!(drain(&client, &url, &alice).await, vec![FlashMessage::new("info", "a")]);
        relay.stop().await.unwrap();
    }

    // =============================================================================
    // REJECTIONS
    // =============================================================================

    #[tokio::test]
    async fn test_unauthenticated_requests_never_reach_store() {
        let store = memory_store(Duration::from_secs(60));
        let relay = spawn_relay(RelayConfig::default(), store.clone()).await;
        let client = Client::new();
        let url = relay.flash_url();

        let response = client
            .post(&url)
            .json(&json!([{"type": "info", "content": "x"}]))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.bytes().await.unwrap().is_empty());

        let response = client
            .get(&url)
            .header("authorization", "Basic YWxpY2U6c2VjcmV0")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = client.get(&url).bearer_auth("not.a.jwt").send().await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        assert_eq!(store.queue_count(), 0);
        relay.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_body_is_rejected_without_side_effects() {
        let store = memory_store(Duration::from_secs(60));
        let relay = spawn_relay(RelayConfig::default(), store.clone()).await;
        let client = Client::new();
        let url = relay.flash_url();
        let token = token_for("alice");

        let response = client
            .post(&url)
            .bearer_auth(&token)
            .header("content-type", "application/json")
            .body("{\"type\":\"info\"")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({"error": "invalid request"}));

        assert!(!store.contains(&Identity::new("alice")));
        relay.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let mut config = RelayConfig::default();
        config.http.max_body_bytes = 1024;
        let store = memory_store(Duration::from_secs(60));
        let relay = spawn_relay(config, store.clone()).await;
        let client = Client::new();

        let body = json!([{"type": "info", "content": "x".repeat(4096)}]);
        let status = post(&client, &relay.flash_url(), &token_for("alice"), &body).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(store.queue_count(), 0);
        relay.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let relay = spawn_relay(RelayConfig::default(), memory_store(Duration::from_secs(60))).await;
        let response = Client::new()
            .get(relay.url("/api/v1/user/inbox"))
            .bearer_auth(token_for("alice"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        relay.stop().await.unwrap();
    }

    // =============================================================================
    // RETENTION
    // =============================================================================

    #[tokio::test]
    async fn test_unread_messages_expire() {
        let relay = spawn_relay(RelayConfig::default(), memory_store(Duration::from_secs(1))).await;
        let client = Client::new();
        let url = relay.flash_url();
        let token = token_for("alice");

        post(&client, &url, &token, &json!([{"type": "info", "content": "stale"}])).await;
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert!(drain(&client, &url, &token).await.is_empty());
        relay.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_enqueue_refreshes_retention_for_whole_queue() {
        let store = memory_store(Duration::from_secs(2));
        let relay = spawn_relay(RelayConfig::default(), store.clone()).await;
        let client = Client::new();
        let url = relay.flash_url();
        let token = token_for("alice");

        post(&client, &url, &token, &json!([{"type": "info", "content": "first"}])).await;
        tokio::time::sleep(Duration::from_millis(1200)).await;
        post(&client, &url, &token, &json!([{"type": "info", "content": "second"}])).await;
        tokio::time::sleep(Duration::from_millis(1200)).await;

        // 2.4s after the first post, but only 1.2s after the refresh
        let drained = drain(&client, &url, &token).await;
        assert_eq!(
            drained,
            vec![FlashMessage::new("info", "first"), FlashMessage::new("info", "second")]
        );
        relay.stop().await.unwrap();
    }

    // =============================================================================
    // LIFECYCLE
    // =============================================================================

    #[tokio::test]
    async fn test_health_checks_answer_without_credentials() {
        let relay = spawn_relay(RelayConfig::default(), memory_store(Duration::from_secs(60))).await;
        let client = Client::new();

        for check in ["live", "ready"] {
            let response = client.get(relay.health_url(check)).send().await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let body: Value = response.json().await.unwrap();
            assert_eq!(body, json!({"status": "UP"}));
        }
        relay.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_graceful_shutdown_stops_listener() {
        let relay = spawn_relay(RelayConfig::default(), memory_store(Duration::from_secs(60))).await;
        let addr = relay.addr;
        relay.stop().await.unwrap();

        let result = tokio::net::TcpStream::connect(addr).await;
        assert!(result.is_err());
    }
}
