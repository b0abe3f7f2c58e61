//! Storage for rendered graph artifacts

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Artifact I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A saved rendered image, addressed by its generated id
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphArtifact {
    pub id: Uuid,
    pub storage_path: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Storage port for artifact bytes
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persist `bytes` under `id` and return where they were stored
    async fn put(&self, id: Uuid, bytes: &[u8]) -> Result<String, ArtifactError>;

    async fn get(&self, id: Uuid) -> Result<Option<Vec<u8>>, ArtifactError>;

    /// Remove the bytes stored under `id`; unknown ids are not an error
    async fn delete(&self, id: Uuid) -> Result<(), ArtifactError>;
}

/// Keeps artifacts as PNG files in a private temporary directory.
/// The directory is removed when the store is dropped.
pub struct FsArtifactStore {
    dir: TempDir,
}

impl FsArtifactStore {
    /// Create a fresh storage directory under `root`, or the system temp dir
    pub fn new(root: Option<&Path>) -> Result<Self, ArtifactError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("tx_graphs_");
        let dir = match root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        debug!("Artifact directory created at {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn file_path(&self, id: Uuid) -> PathBuf {
        self.dir.path().join(format!("graph_{}.png", id))
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn put(&self, id: Uuid, bytes: &[u8]) -> Result<String, ArtifactError> {
        let path = self.file_path(id);
        tokio::fs::write(&path, bytes).await?;
        Ok(path.to_string_lossy().into_owned())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Vec<u8>>, ArtifactError> {
        match tokio::fs::read(self.file_path(id)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), ArtifactError> {
        match tokio::fs::remove_file(self.file_path(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory artifact store
#[derive(Default)]
pub struct MemoryArtifactStore {
    blobs: Mutex<HashMap<Uuid, Vec<u8>>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn put(&self, id: Uuid, bytes: &[u8]) -> Result<String, ArtifactError> {
        self.blobs.lock().await.insert(id, bytes.to_vec());
        Ok(format!("memory://{}", id))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Vec<u8>>, ArtifactError> {
        Ok(self.blobs.lock().await.get(&id).cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<(), ArtifactError> {
        self.blobs.lock().await.remove(&id);
        Ok(())
    }
}
