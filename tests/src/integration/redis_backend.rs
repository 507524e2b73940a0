//! # Redis Backend Flows
//!
//! The HTTP flows again, backed by a real Redis. Ignored unless a server is
//! available:
//!
//! ```bash
//! FLASH_TEST_REDIS_URL=redis://127.0.0.1:6379/15 cargo test -p flash-tests -- --ignored
//! ```

#[cfg(test)]
mod tests {
    use crate::harness::{spawn_relay, token_for};
    use flash_relay::adapters::redis_store::key_ttl;
    use flash_relay::domain::StoreConfig;
    use flash_relay::{FlashMessage, Identity, RedisFlashStore, RelayConfig, StoreBackend};
    use reqwest::{Client, StatusCode};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    fn redis_config() -> RelayConfig {
        let mut config = RelayConfig::default();
        config.store = StoreConfig {
            backend: StoreBackend::Redis,
            url: std::env::var("FLASH_TEST_REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379/15".to_string()),
            ..StoreConfig::default()
        };
        config
    }

    fn unique_subject(tag: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        format!("flash-tests-{}-{}", tag, nanos)
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_round_trip_sets_retention() {
        let config = redis_config();
        let store = Arc::new(RedisFlashStore::connect(&config.store).await.unwrap());
        let relay = spawn_relay(config, store.clone()).await;
        let client = Client::new();
        let subject = unique_subject("round-trip");
        let token = token_for(&subject);

        let response = client
            .post(relay.flash_url())
            .bearer_auth(&token)
            .json(&json!([{"type": "info", "content": "from redis"}]))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let ttl = key_ttl(&store, &Identity::new(subject.as_str()))
            .await
            .unwrap()
            .expect("key has a ttl");
        assert!(ttl <= Duration::from_secs(60) && ttl >= Duration::from_secs(55));

        let drained: Vec<FlashMessage> = client
            .get(relay.flash_url())
            .bearer_auth(&token)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(drained, vec![FlashMessage::new("info", "from redis")]);

        assert_eq!(key_ttl(&store, &Identity::new(subject.as_str())).await.unwrap(), None);
        relay.stop().await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_readiness_with_redis() {
        let config = redis_config();
        let store = Arc::new(RedisFlashStore::connect(&config.store).await.unwrap());
        let relay = spawn_relay(config, store).await;

        let response = Client::new().get(relay.health_url("ready")).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        relay.stop().await.unwrap();
    }
}
