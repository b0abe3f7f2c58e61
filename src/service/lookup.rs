//! Read-through wrappers around the analytics provider.
//!
//! Every lookup follows the same policy: a cached result is returned with a
//! `fromCache` marker and no provider call; otherwise the provider is called,
//! an error-free result is cached, and the raw result is returned either way.

use crate::cache::{CacheGuard, DataKind, InvestigationCache, InvestigationSummary, Lookup};
use crate::graph::transform::{self, transaction_records};
use crate::models::{Coin, RiskTarget, TxQuery};
use crate::provider::{AnalyticsProvider, ProviderError};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

pub const FROM_CACHE: &str = "fromCache";
pub const DATA_STORED_FOR_GRAPH: &str = "dataStoredForGraph";
pub const GRAPH_EDGE_COUNT: &str = "graphEdgeCount";

/// A payload is error-shaped when it has an `error` key or reports `"success": false`
pub fn is_error_payload(value: &Value) -> bool {
    value.get("error").is_some() || value.get("success").and_then(Value::as_bool) == Some(false)
}

/// Provider outcome flattened into data; `Ok` only for cacheable payloads
fn classify(result: Result<Value, ProviderError>) -> Result<Value, Value> {
    match result {
        Ok(value) if value.is_object() && !is_error_payload(&value) => Ok(value),
        Ok(value) => Err(value),
        Err(e) => Err(e.into_payload()),
    }
}

fn annotate(value: &mut Value, key: &str, annotation: Value) {
    if let Value::Object(map) = value {
        map.insert(key.to_string(), annotation);
    }
}

/// Final caller-facing value: hits carry `fromCache = true`
fn respond(lookup: Lookup) -> Value {
    match lookup {
        Lookup::Hit(mut value) => {
            annotate(&mut value, FROM_CACHE, Value::Bool(true));
            value
        }
        Lookup::Stored(value) | Lookup::Rejected(value) => value,
    }
}

#[derive(Clone)]
pub struct CachedLookupService {
    provider: Arc<dyn AnalyticsProvider>,
    cache: Arc<InvestigationCache>,
}

impl CachedLookupService {
    pub fn new(provider: Arc<dyn AnalyticsProvider>, cache: Arc<InvestigationCache>) -> Self {
        Self { provider, cache }
    }

    pub fn cache(&self) -> &Arc<InvestigationCache> {
        &self.cache
    }

    /// Provider health; never cached
    pub async fn api_status(&self) -> Value {
        self.provider
            .status()
            .await
            .unwrap_or_else(ProviderError::into_payload)
    }

    pub async fn address_labels(&self, coin: Coin, address: &str) -> Value {
        let fetch = async { classify(self.provider.address_labels(coin, address).await) };
        respond(
            self.cache
                .address_read_through(coin, address, DataKind::Labels, fetch)
                .await,
        )
    }

    pub async fn address_overview(&self, coin: Coin, address: &str) -> Value {
        let fetch = async { classify(self.provider.address_overview(coin, address).await) };
        respond(
            self.cache
                .address_read_through(coin, address, DataKind::Overview, fetch)
                .await,
        )
    }

    pub async fn address_actions(&self, coin: Coin, address: &str) -> Value {
        let fetch = async { classify(self.provider.address_actions(coin, address).await) };
        respond(
            self.cache
                .address_read_through(coin, address, DataKind::Actions, fetch)
                .await,
        )
    }

    pub async fn address_profile(&self, coin: Coin, address: &str) -> Value {
        let fetch = async { classify(self.provider.address_profile(coin, address).await) };
        respond(
            self.cache
                .address_read_through(coin, address, DataKind::Profile, fetch)
                .await,
        )
    }

    /// Address targets use the address namespace, transaction targets the
    /// transaction namespace
    pub async fn risk_score(&self, coin: Coin, target: &RiskTarget) -> Value {
        let fetch = async { classify(self.provider.risk_score(coin, target).await) };
        let lookup = match target {
            RiskTarget::Address(address) => {
                self.cache
                    .address_read_through(coin, address, DataKind::RiskScore, fetch)
                    .await
            }
            RiskTarget::Transaction(txid) => {
                self.cache.transaction_read_through(coin, txid, fetch).await
            }
        };
        respond(lookup)
    }

    /// Raw transaction history, bypassing the cache and the graph slot
    pub async fn transactions_investigation(&self, coin: Coin, address: &str, query: &TxQuery) -> Value {
        self.provider
            .transactions_investigation(coin, address, query)
            .await
            .unwrap_or_else(ProviderError::into_payload)
    }

    /// Transaction history that also primes the current graph data.
    ///
    /// Time-filtered queries are neither cached nor served from the cache. A
    /// cached page is re-transformed on every hit so the graph slot follows the
    /// most recently requested data. The fetch and the graph update run under
    /// one cache guard.
    pub async fn transactions_and_store(&self, coin: Coin, address: &str, query: &TxQuery) -> Value {
        let cache = self.cache.guard().await;
        let fetch = async {
            match self.provider.transactions_investigation(coin, address, query).await {
                Ok(value) if value.get("data").is_some() && !is_error_payload(&value) => Ok(value),
                Ok(value) => Err(value),
                Err(e) => Err(e.into_payload()),
            }
        };

        let (mut value, from_cache) = if query.is_time_filtered() {
            debug!("Time-filtered query for {} {}, bypassing cache", coin, address);
            (fetch.await.unwrap_or_else(|rejected| rejected), false)
        } else {
            let kind = DataKind::TxInvestigation {
                tx_type: query.tx_type,
                page: query.page,
            };
            let lookup = cache.address_read_through(coin, address, kind, fetch).await;
            let from_cache = lookup.is_hit();
            (lookup.into_value(), from_cache)
        };

        if from_cache {
            annotate(&mut value, FROM_CACHE, Value::Bool(true));
        }
        if value.get("data").is_some() {
            let edge_count = store_graph(&cache, &value).await;
            annotate(&mut value, DATA_STORED_FOR_GRAPH, Value::Bool(true));
            annotate(&mut value, GRAPH_EDGE_COUNT, Value::from(edge_count));
        }
        value
    }

    pub async fn investigation_summary(&self) -> InvestigationSummary {
        self.cache.summary().await
    }
}

/// Transform `raw` into the current graph data and record discovered txids
async fn store_graph(cache: &CacheGuard<'_>, raw: &Value) -> usize {
    let transformed = transform::transform(raw);
    let skipped = transformed.skipped().count();
    if skipped > 0 {
        info!(
            "{} of {} transaction records skipped while building graph",
            skipped,
            transaction_records(raw).map_or(0, Vec::len)
        );
    }

    cache.mark_transactions_analyzed(&transformed.txids).await;
    let edge_count = transformed.edges.len();
    cache.set_current_graph_data(transformed.edges).await;
    edge_count
}
