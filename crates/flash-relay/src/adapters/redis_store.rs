//! Redis-backed flash store.
//!
//! Enqueue runs `MULTI; RPUSH; PEXPIRE; EXEC` on the shared multiplexed
//! connection. Drain is an optimistic transaction (`WATCH; LRANGE; MULTI;
//! DEL; EXEC`) and needs a connection to itself, since WATCH state is
//! per-connection and another task's EXEC would clear it. Those connections
//! come from a small pool capped by `store.drain_connections`.

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig, MultiplexedConnection};
use redis::{AsyncCommands, AsyncConnectionConfig, Client};
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore, SemaphorePermit};
use tracing::{debug, info};

use crate::domain::{
    decode_entries, encode_batch, FlashMessage, Identity, RetryPolicy, StoreConfig, StoreError,
};
use crate::ports::FlashStore;

/// Connections reserved for WATCH transactions. Each is held by one drain at
/// a time and goes back to `idle` unless the drain failed mid-transaction.
struct DrainPool {
    config: AsyncConnectionConfig,
    permits: Semaphore,
    idle: Mutex<Vec<MultiplexedConnection>>,
}

/// Flash store on a Redis server.
pub struct RedisFlashStore {
    client: Client,
    shared: ConnectionManager,
    drains: DrainPool,
    retention_ms: i64,
    retry: RetryPolicy,
}

impl RedisFlashStore {
    /// Open the client and the shared connection. Fails fast if the server is
    /// unreachable within the connect timeout.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = Client::open(config.url.as_str())?;

        let manager_config = ConnectionManagerConfig::new()
            .set_connection_timeout(config.connect_timeout)
            .set_response_timeout(config.response_timeout);
        let shared = ConnectionManager::new_with_config(client.clone(), manager_config).await?;

        let drains = DrainPool {
            config: AsyncConnectionConfig::new()
                .set_connection_timeout(config.connect_timeout)
                .set_response_timeout(config.response_timeout),
            permits: Semaphore::new(config.drain_connections),
            idle: Mutex::new(Vec::with_capacity(config.drain_connections)),
        };

        info!(
            retention_ms = config.retention.as_millis() as u64,
            max_attempts = config.retry.max_attempts,
            drain_connections = config.drain_connections,
            "Connected to Redis flash store"
        );

        Ok(Self {
            client,
            shared,
            drains,
            retention_ms: retention_millis(config.retention),
            retry: config.retry,
        })
    }

    /// Connections currently parked in the drain pool.
    pub async fn idle_drain_connections(&self) -> usize {
        self.drains.idle.lock().await.len()
    }

    /// Wait for a drain slot, then reuse an idle connection or open one.
    async fn checkout(&self) -> Result<(SemaphorePermit<'_>, MultiplexedConnection), StoreError> {
        let permit = self
            .drains
            .permits
            .acquire()
            .await
            .map_err(|_| StoreError::Backend("drain pool closed".into()))?;

        let pooled = self.drains.idle.lock().await.pop();
        let conn = match pooled {
            Some(conn) => conn,
            None => {
                debug!("Opening drain connection");
                self.client
                    .get_multiplexed_async_connection_with_config(&self.drains.config)
                    .await?
            }
        };
        Ok((permit, conn))
    }

    async fn checkin(&self, conn: MultiplexedConnection) {
        self.drains.idle.lock().await.push(conn);
    }

    /// WATCH the key and read the whole queue. On a non-empty result the
    /// WATCH stays armed for [`Self::commit_delete`].
    async fn watch_and_read(
        conn: &mut MultiplexedConnection,
        key: &str,
    ) -> Result<Vec<FlashMessage>, StoreError> {
        let _: () = redis::cmd("WATCH").arg(key).query_async(conn).await?;

        let raw: Vec<Vec<u8>> = conn.lrange(key, 0, -1).await?;
        if raw.is_empty() {
            let _: () = redis::cmd("UNWATCH").query_async(conn).await?;
            return Ok(Vec::new());
        }

        // Decode before deleting: a corrupt queue stays put until it expires.
        match decode_entries(&raw) {
            Ok(messages) => Ok(messages),
            Err(e) => {
                let _: () = redis::cmd("UNWATCH").query_async(conn).await?;
                Err(e)
            }
        }
    }

    /// `MULTI; DEL; EXEC`. `false` means the key changed since WATCH.
    async fn commit_delete(conn: &mut MultiplexedConnection, key: &str) -> Result<bool, StoreError> {
        let committed: Option<(i64,)> = redis::pipe()
            .atomic()
            .del(key)
            .query_async(conn)
            .await?;
        Ok(committed.is_some())
    }

    /// One optimistic attempt. `Ok(None)` means the key changed under WATCH.
    async fn drain_once(
        conn: &mut MultiplexedConnection,
        key: &str,
    ) -> Result<Option<Vec<FlashMessage>>, StoreError> {
        let messages = Self::watch_and_read(conn, key).await?;
        if messages.is_empty() {
            return Ok(Some(messages));
        }
        Ok(Self::commit_delete(conn, key).await?.then_some(messages))
    }

    async fn drain_with_retry(
        &self,
        conn: &mut MultiplexedConnection,
        identity: &Identity,
        key: &str,
    ) -> Result<Vec<FlashMessage>, StoreError> {
        for attempt in 1..=self.retry.max_attempts {
            if let Some(messages) = Self::drain_once(conn, key).await? {
                return Ok(messages);
            }

            debug!(identity = %identity, attempt, "queue changed during drain, retrying");
            if attempt < self.retry.max_attempts {
                tokio::time::sleep(self.retry.delay_for(attempt)).await;
            }
        }

        Err(StoreError::Contention {
            attempts: self.retry.max_attempts,
        })
    }
}

#[async_trait]
impl FlashStore for RedisFlashStore {
    async fn enqueue(
        &self,
        identity: &Identity,
        messages: &[FlashMessage],
    ) -> Result<(), StoreError> {
        let entries = encode_batch(messages)?;
        if entries.is_empty() {
            return Ok(());
        }

        let key = identity.queue_key();
        let mut conn = self.shared.clone();
        let _: () = redis::pipe()
            .atomic()
            .rpush(&key, entries.as_slice())
            .ignore()
            .pexpire(&key, self.retention_ms)
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(())
    }

    async fn drain_and_clear(&self, identity: &Identity) -> Result<Vec<FlashMessage>, StoreError> {
        let key = identity.queue_key();
        let (_permit, mut conn) = self.checkout().await?;

        let result = self.drain_with_retry(&mut conn, identity, &key).await;
        match &result {
            // Every outcome here ends with EXEC or UNWATCH, so no WATCH leaks.
            Ok(_) | Err(StoreError::CorruptEntry { .. }) | Err(StoreError::Contention { .. }) => {
                self.checkin(conn).await;
            }
            Err(e) => debug!(error = %e, "Dropping drain connection"),
        }
        result
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.shared.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

/// Retention as a `PEXPIRE` argument. Never below 1 ms.
fn retention_millis(retention: Duration) -> i64 {
    i64::try_from(retention.as_millis()).unwrap_or(i64::MAX).max(1)
}

/// Time left on a key, for tests and diagnostics. `None` when the key is
/// absent or has no expiry.
pub async fn key_ttl(
    store: &RedisFlashStore,
    identity: &Identity,
) -> Result<Option<Duration>, StoreError> {
    let mut conn = store.shared.clone();
    let ttl_ms: i64 = conn.pttl(identity.queue_key()).await?;
    Ok((ttl_ms >= 0).then(|| Duration::from_millis(ttl_ms as u64)))
}
