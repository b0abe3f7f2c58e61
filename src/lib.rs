pub mod api;
pub mod cache;
pub mod config;
pub mod graph;
pub mod models;
pub mod provider;
pub mod service;
pub mod state;
pub mod validation;

#[cfg(test)]
pub mod tests;

// Re-export specific items for convenience if desired
pub use api::error::ApiError;
pub use api::response::ApiResponse;
pub use api::route::create_router;
pub use cache::{DataKind, InvestigationCache, InvestigationSummary};
pub use graph::transform::transform;
pub use models::{Coin, Edge, RiskTarget, TxQuery, TxType};
pub use provider::{AnalyticsProvider, MistTrackClient, ProviderError};
pub use service::{CachedLookupService, GraphService, InvestigationSession, SessionRegistry};
pub use validation::{validate_address, validate_coin, validate_risk_target};
