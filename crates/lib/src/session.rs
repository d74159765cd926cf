//! Per-conversation relay mode.
//!
//! Conversations start in [`ConversationMode::Normal`]. Only conversations in forwarding mode
//! are stored; returning to normal removes the entry. An optional idle TTL lets abandoned
//! forwarding conversations revert to normal.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Opaque conversation identifier supplied by the transport.
pub type ConversationId = String;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConversationMode {
    /// Messages go to the completion provider.
    #[default]
    Normal,
    /// Messages are relayed to the peer agent.
    Forwarding,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    last_seen: Instant,
}

/// In-memory store: conversation id -> forwarding entry. Shared across the gateway.
pub struct ConversationModeStore {
    inner: Arc<RwLock<HashMap<ConversationId, Entry>>>,
    idle_ttl: Option<Duration>,
}

impl Default for ConversationModeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationModeStore {
    /// Store without eviction: forwarding lasts until `set_normal`.
    pub fn new() -> Self {
        Self::with_idle_ttl(None)
    }

    pub fn with_idle_ttl(idle_ttl: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            idle_ttl,
        }
    }

    pub fn idle_ttl(&self) -> Option<Duration> {
        self.idle_ttl
    }

    fn expired(&self, entry: &Entry, now: Instant) -> bool {
        self.idle_ttl
            .map_or(false, |ttl| now.duration_since(entry.last_seen) > ttl)
    }

    /// Current mode. Unknown conversations are Normal; a forwarding entry idle past the TTL
    /// is dropped and reads as Normal. Reading a live entry refreshes its idle clock.
    pub async fn mode(&self, id: &str) -> ConversationMode {
        if self.idle_ttl.is_none() {
            return Self::mode_of(self.inner.read().await.contains_key(id));
        }
        let mut g = self.inner.write().await;
        self.live_mode(&mut g, id, Instant::now())
    }

    fn mode_of(forwarding: bool) -> ConversationMode {
        if forwarding {
            ConversationMode::Forwarding
        } else {
            ConversationMode::Normal
        }
    }

    /// Mode under an already held write lock; drops an expired entry and refreshes a live one.
    fn live_mode(
        &self,
        g: &mut HashMap<ConversationId, Entry>,
        id: &str,
        now: Instant,
    ) -> ConversationMode {
        let expired = match g.get_mut(id) {
            None => return ConversationMode::Normal,
            Some(entry) => {
                if self.expired(entry, now) {
                    true
                } else {
                    entry.last_seen = now;
                    false
                }
            }
        };
        if expired {
            g.remove(id);
            log::debug!("mode store: forwarding for {} expired", id);
            ConversationMode::Normal
        } else {
            ConversationMode::Forwarding
        }
    }

    /// Switch `id` from `from` to `to` if it is currently in `from`. Check and switch happen
    /// under one write lock, so of two concurrent callers at most one succeeds.
    pub async fn switch_mode(&self, id: &str, from: ConversationMode, to: ConversationMode) -> bool {
        let now = Instant::now();
        let mut g = self.inner.write().await;
        if self.live_mode(&mut g, id, now) != from {
            return false;
        }
        match to {
            ConversationMode::Forwarding => {
                g.insert(id.to_string(), Entry { last_seen: now });
            }
            ConversationMode::Normal => {
                g.remove(id);
            }
        }
        true
    }

    pub async fn set_forwarding(&self, id: impl Into<ConversationId>) {
        let entry = Entry {
            last_seen: Instant::now(),
        };
        self.inner.write().await.insert(id.into(), entry);
    }

    /// Returns true if the conversation was forwarding.
    pub async fn set_normal(&self, id: &str) -> bool {
        self.inner.write().await.remove(id).is_some()
    }

    /// Ids of conversations currently stored as forwarding (unordered).
    pub async fn forwarding_ids(&self) -> Vec<ConversationId> {
        self.inner.read().await.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Remove entries idle past the TTL. Returns how many were removed; no-op without a TTL.
    pub async fn evict_idle(&self) -> usize {
        if self.idle_ttl.is_none() {
            return 0;
        }
        let now = Instant::now();
        let mut g = self.inner.write().await;
        let before = g.len();
        g.retain(|_, entry| !self.expired(entry, now));
        before - g.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_conversation_is_normal() {
        let store = ConversationModeStore::new();
        assert_eq!(store.mode("never-seen").await, ConversationMode::Normal);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn forwarding_until_set_normal() {
        let store = ConversationModeStore::new();
        store.set_forwarding("c1").await;
        assert_eq!(store.mode("c1").await, ConversationMode::Forwarding);
        assert_eq!(store.mode("c2").await, ConversationMode::Normal);
        assert_eq!(store.forwarding_ids().await, vec!["c1".to_string()]);
        assert!(store.set_normal("c1").await);
        assert!(!store.set_normal("c1").await);
        assert_eq!(store.mode("c1").await, ConversationMode::Normal);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn no_ttl_never_evicts() {
        let store = ConversationModeStore::new();
        store.set_forwarding("c1").await;
        assert_eq!(store.evict_idle().await, 0);
        assert_eq!(store.mode("c1").await, ConversationMode::Forwarding);
    }

    #[tokio::test]
    async fn idle_entries_expire() {
        let store = ConversationModeStore::with_idle_ttl(Some(Duration::from_millis(20)));
        store.set_forwarding("idle").await;
        store.set_forwarding("swept").await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.mode("idle").await, ConversationMode::Normal);
        assert_eq!(store.evict_idle().await, 1);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn switch_mode_only_from_the_expected_mode() {
        let store = ConversationModeStore::new();
        assert!(!store.switch_mode("c1", ConversationMode::Forwarding, ConversationMode::Normal).await);
        assert!(store.switch_mode("c1", ConversationMode::Normal, ConversationMode::Forwarding).await);
        assert!(!store.switch_mode("c1", ConversationMode::Normal, ConversationMode::Forwarding).await);
        assert_eq!(store.mode("c1").await, ConversationMode::Forwarding);
        assert!(store.switch_mode("c1", ConversationMode::Forwarding, ConversationMode::Normal).await);
        assert!(store.is_empty().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_switches_have_one_winner() {
        let store = Arc::new(ConversationModeStore::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .switch_mode("c1", ConversationMode::Normal, ConversationMode::Forwarding)
                    .await
            }));
        }
        let mut winners = 0;
        for h in handles {
            if h.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn switch_mode_treats_expired_entry_as_normal() {
        let store = ConversationModeStore::with_idle_ttl(Some(Duration::from_millis(20)));
        store.set_forwarding("c1").await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!store.switch_mode("c1", ConversationMode::Forwarding, ConversationMode::Normal).await);
        assert!(store.switch_mode("c1", ConversationMode::Normal, ConversationMode::Forwarding).await);
        assert_eq!(store.mode("c1").await, ConversationMode::Forwarding);
    }
}
