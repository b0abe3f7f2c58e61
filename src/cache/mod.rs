//! Session-scoped investigation cache
//!
//! Holds every cached provider lookup for one investigation, the sets of
//! addresses and transactions already investigated, the most recently
//! materialized transaction graph, free-form shared state, and the index of
//! rendered graph artifacts. Nothing expires; `clear` is the only way out.
//!
//! Multi-step work (a read-through and its bookkeeping, a render and its
//! artifact) runs under a [`CacheGuard`]. `clear` waits for every outstanding
//! guard and blocks new ones until the reset is complete, so nothing fetched
//! before a clear can be committed after it.

pub mod artifact;
pub mod entry;
pub mod keys;

pub use artifact::{ArtifactError, ArtifactStore, FsArtifactStore, GraphArtifact, MemoryArtifactStore};
pub use entry::{CacheEntry, EntryCacheManager, Lookup};
pub use keys::{CacheKey, DataKind};

use crate::models::{Coin, Edge};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Free-form value shared between tools
#[derive(Debug, Clone)]
pub struct StateValue {
    pub value: Value,
    pub last_updated: DateTime<Utc>,
}

/// Live projection of what the investigation has touched so far
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestigationSummary {
    pub addresses_investigated: Vec<String>,
    pub transactions_analyzed: Vec<String>,
    pub cache_size: u64,
    pub state_keys: Vec<String>,
    pub artifact_ids: Vec<Uuid>,
}

impl InvestigationSummary {
    pub fn is_empty(&self) -> bool {
        self.addresses_investigated.is_empty()
            && self.transactions_analyzed.is_empty()
            && self.cache_size == 0
            && self.state_keys.is_empty()
            && self.artifact_ids.is_empty()
    }
}

#[derive(Default)]
struct SessionState {
    /// Keys of every entry written to the cache; the source of `cache_size`
    cached_keys: HashSet<CacheKey>,
    addresses_investigated: HashSet<String>,
    transactions_analyzed: HashSet<String>,
    generic: HashMap<String, StateValue>,
    current_graph: Vec<Edge>,
    artifacts: HashMap<Uuid, GraphArtifact>,
}

impl SessionState {
    fn commit_address(&mut self, key: CacheKey, address: &str) {
        self.cached_keys.insert(key);
        if self.addresses_investigated.insert(address.to_string()) {
            debug!("Address {} marked as investigated", address);
        }
    }

    fn commit_transaction(&mut self, key: CacheKey, txid: &str) {
        self.cached_keys.insert(key);
        self.transactions_analyzed.insert(txid.to_string());
    }
}

pub struct InvestigationCache {
    entries: EntryCacheManager,
    gate: RwLock<()>,
    state: RwLock<SessionState>,
    store: Arc<dyn ArtifactStore>,
}

impl InvestigationCache {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            entries: EntryCacheManager::new(),
            gate: RwLock::new(()),
            state: RwLock::new(SessionState::default()),
            store,
        }
    }

    /// Cache backed by an in-memory artifact store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryArtifactStore::new()))
    }

    pub async fn put(&self, key: &str, value: Value) {
        let mut state = self.state.write().await;
        state.generic.insert(
            key.to_string(),
            StateValue {
                value,
                last_updated: Utc::now(),
            },
        );
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        let state = self.state.read().await;
        state.generic.get(key).map(|entry| entry.value.clone())
    }

    pub async fn get_entry(&self, key: &str) -> Option<StateValue> {
        self.state.read().await.generic.get(key).cloned()
    }

    pub async fn cache_address_data(&self, coin: Coin, address: &str, kind: DataKind, data: Value) {
        let key = CacheKey::address(coin, address, kind);
        let mut state = self.state.write().await;
        self.entries.insert(key.clone(), data).await;
        state.commit_address(key, address);
    }

    pub async fn get_cached_address_data(
        &self,
        coin: Coin,
        address: &str,
        kind: DataKind,
    ) -> Option<Value> {
        self.entries
            .get(&CacheKey::address(coin, address, kind))
            .await
            .map(|entry| entry.value)
    }

    pub async fn cache_transaction_data(&self, coin: Coin, txid: &str, data: Value) {
        let key = CacheKey::transaction(coin, txid);
        let mut state = self.state.write().await;
        self.entries.insert(key.clone(), data).await;
        state.commit_transaction(key, txid);
    }

    pub async fn get_cached_transaction_data(&self, coin: Coin, txid: &str) -> Option<Value> {
        self.entries
            .get(&CacheKey::transaction(coin, txid))
            .await
            .map(|entry| entry.value)
    }

    /// Hold the cache open for a multi-step operation; `clear` waits for it
    pub async fn guard(&self) -> CacheGuard<'_> {
        CacheGuard {
            cache: self,
            _hold: self.gate.read().await,
        }
    }

    /// Read-through for an address-scoped key. See [`CacheGuard::address_read_through`].
    pub async fn address_read_through<F>(
        &self,
        coin: Coin,
        address: &str,
        kind: DataKind,
        fetch: F,
    ) -> Lookup
    where
        F: Future<Output = Result<Value, Value>>,
    {
        self.guard()
            .await
            .address_read_through(coin, address, kind, fetch)
            .await
    }

    /// Read-through for a transaction-scoped key
    pub async fn transaction_read_through<F>(&self, coin: Coin, txid: &str, fetch: F) -> Lookup
    where
        F: Future<Output = Result<Value, Value>>,
    {
        self.guard()
            .await
            .transaction_read_through(coin, txid, fetch)
            .await
    }

    pub async fn mark_transactions_analyzed<I, S>(&self, txids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state = self.state.write().await;
        for txid in txids {
            state.transactions_analyzed.insert(txid.as_ref().to_string());
        }
    }

    /// Replace the current graph data; never appends
    pub async fn set_current_graph_data(&self, edges: Vec<Edge>) {
        debug!("Storing {} edges as current graph data", edges.len());
        self.state.write().await.current_graph = edges;
    }

    pub async fn current_graph_data(&self) -> Vec<Edge> {
        self.state.read().await.current_graph.clone()
    }

    /// Snapshot taken under a single read of the session state
    pub async fn summary(&self) -> InvestigationSummary {
        let state = self.state.read().await;
        let cache_size = state.cached_keys.len() as u64;

        let mut addresses_investigated: Vec<_> =
            state.addresses_investigated.iter().cloned().collect();
        addresses_investigated.sort();
        let mut transactions_analyzed: Vec<_> =
            state.transactions_analyzed.iter().cloned().collect();
        transactions_analyzed.sort();
        let mut state_keys: Vec<_> = state.generic.keys().cloned().collect();
        state_keys.sort();
        let mut artifact_ids: Vec<_> = state.artifacts.keys().copied().collect();
        artifact_ids.sort();

        InvestigationSummary {
            addresses_investigated,
            transactions_analyzed,
            cache_size,
            state_keys,
            artifact_ids,
        }
    }

    /// Persist rendered bytes under a newly generated id
    pub async fn save_artifact(&self, bytes: &[u8], description: &str) -> Result<Uuid, ArtifactError> {
        self.guard().await.save_artifact(bytes, description).await
    }

    pub async fn resolve_artifact(&self, id: Uuid) -> Option<String> {
        let state = self.state.read().await;
        state.artifacts.get(&id).map(|artifact| artifact.storage_path.clone())
    }

    pub async fn artifact(&self, id: Uuid) -> Option<GraphArtifact> {
        self.state.read().await.artifacts.get(&id).cloned()
    }

    /// Bytes of a known artifact; unknown ids resolve to `None`
    pub async fn load_artifact(&self, id: Uuid) -> Result<Option<Vec<u8>>, ArtifactError> {
        if self.resolve_artifact(id).await.is_none() {
            return Ok(None);
        }
        self.store.get(id).await
    }

    /// Empty every structure and delete artifact storage.
    ///
    /// Waits for outstanding guards first. Storage deletion is best-effort:
    /// failures are logged and the in-memory state is cleared regardless.
    pub async fn clear(&self) {
        let _exclusive = self.gate.write().await;
        let mut state = self.state.write().await;
        self.entries.invalidate_all().await;

        let artifacts: Vec<Uuid> = state.artifacts.keys().copied().collect();
        *state = SessionState::default();

        let deletions = artifacts.iter().map(|id| {
            let store = Arc::clone(&self.store);
            let id = *id;
            async move { (id, store.delete(id).await) }
        });
        for (id, result) in futures::future::join_all(deletions).await {
            if let Err(e) = result {
                warn!("Failed to delete artifact {}: {}", id, e);
            }
        }

        info!("Investigation cache cleared ({} artifacts released)", artifacts.len());
    }
}

/// Shared hold on an [`InvestigationCache`].
///
/// Everything done through a guard lands before, or entirely after, any
/// `clear`. Do not take a second guard on the same cache while holding one.
pub struct CacheGuard<'a> {
    cache: &'a InvestigationCache,
    _hold: RwLockReadGuard<'a, ()>,
}

impl CacheGuard<'_> {
    /// `Ok` results from `fetch` are cached and mark the address investigated;
    /// `Err` results are returned as-is.
    pub async fn address_read_through<F>(
        &self,
        coin: Coin,
        address: &str,
        kind: DataKind,
        fetch: F,
    ) -> Lookup
    where
        F: Future<Output = Result<Value, Value>>,
    {
        let key = CacheKey::address(coin, address, kind);
        let lookup = self
            .cache
            .entries
            .get_or_try_insert_with(key.clone(), fetch)
            .await;
        if let Lookup::Stored(_) = lookup {
            self.cache.state.write().await.commit_address(key, address);
        }
        lookup
    }

    pub async fn transaction_read_through<F>(&self, coin: Coin, txid: &str, fetch: F) -> Lookup
    where
        F: Future<Output = Result<Value, Value>>,
    {
        let key = CacheKey::transaction(coin, txid);
        let lookup = self
            .cache
            .entries
            .get_or_try_insert_with(key.clone(), fetch)
            .await;
        if let Lookup::Stored(_) = lookup {
            self.cache.state.write().await.commit_transaction(key, txid);
        }
        lookup
    }

    pub async fn mark_transactions_analyzed<I, S>(&self, txids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.cache.mark_transactions_analyzed(txids).await
    }

    pub async fn set_current_graph_data(&self, edges: Vec<Edge>) {
        self.cache.set_current_graph_data(edges).await
    }

    pub async fn current_graph_data(&self) -> Vec<Edge> {
        self.cache.current_graph_data().await
    }

    pub async fn save_artifact(&self, bytes: &[u8], description: &str) -> Result<Uuid, ArtifactError> {
        let id = Uuid::new_v4();
        let storage_path = self.cache.store.put(id, bytes).await?;
        debug!("Saved artifact {} ({} bytes) at {}", id, bytes.len(), storage_path);

        let artifact = GraphArtifact {
            id,
            storage_path,
            description: description.to_string(),
            created_at: Utc::now(),
        };
        self.cache.state.write().await.artifacts.insert(id, artifact);
        Ok(id)
    }
}
