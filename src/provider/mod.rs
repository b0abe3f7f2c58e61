pub mod client;

// Re-exports for convenience
pub use client::{AnalyticsProvider, MistTrackClient, ProviderError};
