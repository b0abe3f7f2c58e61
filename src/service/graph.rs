use crate::cache::{ArtifactError, InvestigationCache};
use crate::graph::{GraphRenderer, RenderError};
use crate::models::Edge;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// A rendered graph saved as a session artifact
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphReport {
    pub artifact_id: Uuid,
    pub edge_count: usize,
    pub placeholder: bool,
    pub markdown: String,
}

#[derive(Clone)]
pub struct GraphService {
    renderer: Arc<dyn GraphRenderer>,
    cache: Arc<InvestigationCache>,
}

impl GraphService {
    pub fn new(renderer: Arc<dyn GraphRenderer>, cache: Arc<InvestigationCache>) -> Self {
        Self { renderer, cache }
    }

    /// Render `custom_edges`, or the current graph data when none are given.
    /// An empty edge list renders a single "no data" placeholder edge.
    pub async fn render_stored_graph(&self, custom_edges: Option<Vec<Edge>>) -> Result<GraphReport, GraphError> {
        let cache = self.cache.guard().await;
        let edges = match custom_edges {
            Some(edges) if !edges.is_empty() => edges,
            _ => cache.current_graph_data().await,
        };

        let placeholder = edges.is_empty();
        let edges = if placeholder {
            vec![Edge::placeholder()]
        } else {
            edges
        };

        let rendered = self.renderer.render(&edges).await?;
        let description = format!("Transaction graph ({} edges)", edges.len());
        let artifact_id = cache.save_artifact(&rendered.png, &description).await?;
        info!("Rendered graph artifact {} with {} edges", artifact_id, edges.len());

        Ok(GraphReport {
            artifact_id,
            edge_count: if placeholder { 0 } else { edges.len() },
            placeholder,
            markdown: rendered.to_markdown("Transaction graph"),
        })
    }
}
