//! Investigation sessions
//!
//! A session owns its own cache and artifact storage; sessions never see each
//! other's data. The registry hands out sessions by id and tears them down.

use crate::cache::{ArtifactError, ArtifactStore, FsArtifactStore, InvestigationCache, MemoryArtifactStore};
use crate::graph::GraphRenderer;
use crate::provider::AnalyticsProvider;
use crate::service::{CachedLookupService, GraphService};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// Where a session keeps rendered artifacts
#[derive(Debug, Clone)]
pub enum ArtifactBackend {
    /// Private temporary directory, under the given root if any
    Disk(Option<PathBuf>),
    Memory,
}

impl ArtifactBackend {
    fn open(&self) -> Result<Arc<dyn ArtifactStore>, ArtifactError> {
        Ok(match self {
            ArtifactBackend::Disk(root) => Arc::new(FsArtifactStore::new(root.as_deref())?),
            ArtifactBackend::Memory => Arc::new(MemoryArtifactStore::new()),
        })
    }
}

pub struct InvestigationSession {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub cache: Arc<InvestigationCache>,
    pub lookups: CachedLookupService,
    pub graphs: GraphService,
}

impl InvestigationSession {
    pub fn new(
        provider: Arc<dyn AnalyticsProvider>,
        renderer: Arc<dyn GraphRenderer>,
        store: Arc<dyn ArtifactStore>,
    ) -> Self {
        let cache = Arc::new(InvestigationCache::new(store));
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            lookups: CachedLookupService::new(provider, Arc::clone(&cache)),
            graphs: GraphService::new(renderer, Arc::clone(&cache)),
            cache,
        }
    }
}

pub struct SessionRegistry {
    provider: Arc<dyn AnalyticsProvider>,
    renderer: Arc<dyn GraphRenderer>,
    backend: ArtifactBackend,
    sessions: RwLock<HashMap<Uuid, Arc<InvestigationSession>>>,
}

impl SessionRegistry {
    pub fn new(
        provider: Arc<dyn AnalyticsProvider>,
        renderer: Arc<dyn GraphRenderer>,
        backend: ArtifactBackend,
    ) -> Self {
        Self {
            provider,
            renderer,
            backend,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn provider(&self) -> &Arc<dyn AnalyticsProvider> {
        &self.provider
    }

    pub async fn create(&self) -> Result<Arc<InvestigationSession>, ArtifactError> {
        let store = self.backend.open()?;
        let session = Arc::new(InvestigationSession::new(
            Arc::clone(&self.provider),
            Arc::clone(&self.renderer),
            store,
        ));
        self.sessions
            .write()
            .await
            .insert(session.id, Arc::clone(&session));
        info!("Investigation session {} started", session.id);
        Ok(session)
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<InvestigationSession>> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Clear and forget a session. Returns false for unknown ids.
    pub async fn close(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id);
        match removed {
            Some(session) => {
                session.cache.clear().await;
                info!("Investigation session {} closed", id);
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
