pub mod render;
pub mod transform;

// Re-exports for convenience
pub use render::{to_dot, GraphRenderer, GraphvizRenderer, RenderError, RenderedGraph};
pub use transform::{transform, RecordOutcome, RecordReport, SkipReason, Transformed};
