//! Token sessions backed by an expiring key-value store
//!
//! A session is a capability, not a profile cache: the store maps
//! `auth_<token>` to the owning user id and nothing else. Expiry is the
//! store's job; this module never extends or refreshes a session.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use rand::RngCore;
use tracing::debug;

use crate::types::Result;

/// Key prefix for session entries
const SESSION_KEY_PREFIX: &str = "auth_";

/// Opaque expiring string store the sessions live in.
///
/// Redis semantics: `set_ex` overwrites and arms a TTL, `get` of a missing
/// or expired key yields `None`, `del` of a missing key is a no-op.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    async fn del(&self, key: &str) -> Result<()>;

    /// Whether the backing store currently answers requests
    fn is_alive(&self) -> bool;
}

/// In-process expiring key-value store.
///
/// Entries past their deadline are invisible to `get` immediately; the
/// periodic sweep task reclaims their memory.
#[derive(Default)]
pub struct MemoryKv {
    entries: DashMap<String, (String, Instant)>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Drop all expired entries
    pub fn sweep(&self) {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, (_, deadline)| *deadline > now);
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!(removed, "Swept expired key-value entries");
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        // The read guard must be released before the expired entry can be
        // removed; DashMap shard locks are not reentrant.
        let live = self.entries.get(key).and_then(|entry| {
            let (value, deadline) = entry.value();
            (*deadline > Instant::now()).then(|| value.clone())
        });
        if live.is_none() {
            self.entries.remove(key);
        }
        Ok(live)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.entries
            .insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn is_alive(&self) -> bool {
        true
    }
}

/// Spawn a background task that periodically sweeps expired entries
pub fn spawn_sweep_task(store: Arc<MemoryKv>, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            store.sweep();
        }
    })
}

/// Issues, resolves and revokes session tokens against the key-value store.
///
/// The single gate every protected operation passes through.
pub struct SessionManager {
    kv: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(kv: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self { kv, ttl }
    }

    fn session_key(token: &str) -> String {
        format!("{}{}", SESSION_KEY_PREFIX, token)
    }

    /// 32 random bytes, hex encoded. Entropy makes collisions negligible,
    /// so no uniqueness check is performed.
    fn generate_token() -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Issue a fresh token for a user and store it with the configured TTL
    pub async fn issue(&self, user_id: &str) -> Result<String> {
        let token = Self::generate_token();
        self.kv
            .set_ex(&Self::session_key(&token), user_id, self.ttl)
            .await?;
        Ok(token)
    }

    /// Resolve a token to its user id. `None` means unauthenticated
    /// (expired, revoked, or never issued), not an error.
    pub async fn resolve(&self, token: &str) -> Result<Option<String>> {
        self.kv.get(&Self::session_key(token)).await
    }

    /// Revoke a token. Idempotent: revoking an absent token is not an error.
    pub async fn revoke(&self, token: &str) -> Result<()> {
        self.kv.del(&Self::session_key(token)).await
    }

    /// Whether the backing store currently answers requests
    pub fn is_alive(&self) -> bool {
        self.kv.is_alive()
    }
}
