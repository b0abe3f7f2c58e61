//! Renders an edge list to a PNG through graphviz

use crate::models::Edge;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::process::Stdio;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to run graphviz: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Graphviz exited with {status}: {stderr}")]
    Failed { status: i32, stderr: String },

    #[error("Nothing to render")]
    Empty,
}

/// Encoded image ready to embed in a report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedGraph {
    pub png: Vec<u8>,
}

impl RenderedGraph {
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.png)
    }

    /// Markdown image tag with the PNG inlined as a data URI
    pub fn to_markdown(&self, alt: &str) -> String {
        format!("![{}](data:image/png;base64,{})", alt, self.to_base64())
    }
}

#[async_trait]
pub trait GraphRenderer: Send + Sync {
    /// Render a non-empty edge list
    async fn render(&self, edges: &[Edge]) -> Result<RenderedGraph, RenderError>;
}

/// Graphviz DOT source for a left-to-right transfer graph
pub fn to_dot(edges: &[Edge]) -> String {
    let mut dot = String::from("digraph {\n  rankdir=LR;\n  fontsize=12;\n");
    for e in edges {
        dot.push_str(&format!("  \"{}\" [shape=oval];\n", escape(&e.from)));
        dot.push_str(&format!("  \"{}\" [shape=oval];\n", escape(&e.to)));
        dot.push_str(&format!(
            "  \"{}\" -> \"{}\" [label=\"{}\\n{}\", fontsize=10];\n",
            escape(&e.from),
            escape(&e.to),
            escape(&e.value),
            escape(&e.timestamp),
        ));
    }
    dot.push_str("}\n");
    dot
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Pipes DOT source through the `dot` binary
pub struct GraphvizRenderer {
    bin: String,
}

impl GraphvizRenderer {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }
}

impl Default for GraphvizRenderer {
    fn default() -> Self {
        Self::new("dot")
    }
}

#[async_trait]
impl GraphRenderer for GraphvizRenderer {
    async fn render(&self, edges: &[Edge]) -> Result<RenderedGraph, RenderError> {
        if edges.is_empty() {
            return Err(RenderError::Empty);
        }

        let source = to_dot(edges);
        debug!("Rendering graph with {} edges via {}", edges.len(), self.bin);

        let mut child = Command::new(&self.bin)
            .arg("-Tpng")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(source.as_bytes()).await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(RenderError::Failed {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(RenderedGraph { png: output.stdout })
    }
}
