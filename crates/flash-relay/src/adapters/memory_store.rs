//! In-process flash store.
//!
//! Same contract as the Redis adapter, for development and tests. Expiry
//! uses the tokio clock so tests can pause and advance time. Expired queues
//! read as absent at once and are dropped by [`sweep_task`].

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::domain::{decode_entries, encode_batch, FlashMessage, Identity, RetryPolicy, StoreError};
use crate::ports::FlashStore;

#[derive(Debug)]
struct Queue {
    entries: Vec<String>,
    expires_at: Instant,
    /// Bumped on every write; drains commit only against the version they read.
    version: u64,
}

impl Queue {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

enum Snapshot {
    Absent,
    Expired,
    Live { entries: Vec<String>, version: u64 },
}

/// DashMap-backed store keyed by `message::<identity>`.
pub struct MemoryFlashStore {
    queues: DashMap<String, Queue>,
    retention: Duration,
    retry: RetryPolicy,
    versions: AtomicU64,
    /// Runs between decode and commit of every drain attempt.
    #[cfg(test)]
    before_commit: std::sync::OnceLock<CommitHook>,
}

#[cfg(test)]
type CommitHook = Box<dyn Fn(&MemoryFlashStore, &str) + Send + Sync>;

impl MemoryFlashStore {
    pub fn new(retention: Duration, retry: RetryPolicy) -> Self {
        Self {
            queues: DashMap::new(),
            retention,
            retry,
            versions: AtomicU64::new(0),
            #[cfg(test)]
            before_commit: std::sync::OnceLock::new(),
        }
    }

    /// Start the background sweep. The task holds a weak reference and
    /// exits once the store is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(sweep_task(Arc::downgrade(self), interval))
    }

    /// Drop every expired queue. Returns how many were removed.
    pub fn remove_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;

        self.queues.retain(|_, queue| {
            if queue.is_expired(now) {
                removed += 1;
                false
            } else {
                true
            }
        });

        removed
    }

    /// Number of queues held in memory, expired or not.
    pub fn resident_count(&self) -> usize {
        self.queues.len()
    }

    /// Number of live (unexpired) queues.
    pub fn queue_count(&self) -> usize {
        let now = Instant::now();
        self.queues.iter().filter(|q| !q.is_expired(now)).count()
    }

    /// Whether the identity currently has a live queue.
    pub fn contains(&self, identity: &Identity) -> bool {
        let now = Instant::now();
        self.queues
            .get(&identity.queue_key())
            .map(|q| !q.is_expired(now))
            .unwrap_or(false)
    }

    /// Remaining time before the identity's queue expires.
    pub fn ttl(&self, identity: &Identity) -> Option<Duration> {
        let now = Instant::now();
        self.queues
            .get(&identity.queue_key())
            .filter(|q| !q.is_expired(now))
            .map(|q| q.expires_at - now)
    }

    /// Append raw entries, bypassing the codec.
    #[cfg(test)]
    pub(crate) fn push_raw(&self, identity: &Identity, raw: &str) {
        self.append(identity.queue_key(), vec![raw.to_string()]);
    }

    fn next_version(&self) -> u64 {
        self.versions.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn append(&self, key: String, entries: Vec<String>) {
        let now = Instant::now();
        let version = self.next_version();
        let mut queue = self.queues.entry(key).or_insert_with(|| Queue {
            entries: Vec::new(),
            expires_at: now,
            version,
        });
        if queue.is_expired(now) {
            queue.entries.clear();
        }
        queue.entries.extend(entries);
        queue.expires_at = now + self.retention;
        queue.version = version;
    }

    fn snapshot(&self, key: &str, now: Instant) -> Snapshot {
        match self.queues.get(key) {
            None => Snapshot::Absent,
            Some(queue) if queue.is_expired(now) => Snapshot::Expired,
            Some(queue) => Snapshot::Live {
                entries: queue.entries.clone(),
                version: queue.version,
            },
        }
    }
}

#[async_trait]
impl FlashStore for MemoryFlashStore {
    async fn enqueue(
        &self,
        identity: &Identity,
        messages: &[FlashMessage],
    ) -> Result<(), StoreError> {
        let entries = encode_batch(messages)?;
        if entries.is_empty() {
            return Ok(());
        }
        self.append(identity.queue_key(), entries);
        Ok(())
    }

    async fn drain_and_clear(&self, identity: &Identity) -> Result<Vec<FlashMessage>, StoreError> {
        let key = identity.queue_key();

        for attempt in 1..=self.retry.max_attempts {
            let now = Instant::now();
            let (entries, version) = match self.snapshot(&key, now) {
                Snapshot::Absent => return Ok(Vec::new()),
                Snapshot::Expired => {
                    self.queues.remove_if(&key, |_, q| q.is_expired(now));
                    return Ok(Vec::new());
                }
                Snapshot::Live { entries, version } => (entries, version),
            };

            let messages = decode_entries(&entries)?;

            #[cfg(test)]
            if let Some(hook) = self.before_commit.get() {
                hook(self, key.as_str());
            }

            if self
                .queues
                .remove_if(&key, |_, q| q.version == version)
                .is_some()
            {
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

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Periodically purge expired queues until the store is dropped.
pub async fn sweep_task(store: Weak<MemoryFlashStore>, interval: Duration) {
    let mut sweep_interval = tokio::time::interval(interval);
    sweep_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        sweep_interval.tick().await;
        let Some(store) = store.upgrade() else {
            break;
        };
        let removed = store.remove_expired();
        if removed > 0 {
            debug!(removed, remaining = store.resident_count(), "Swept expired flash queues");
        }
    }
}
