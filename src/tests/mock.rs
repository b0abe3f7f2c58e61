//! Scripted provider and renderer doubles shared by the tests

use crate::graph::{GraphRenderer, RenderError, RenderedGraph};
use crate::models::{Coin, Edge, RiskTarget, TxQuery};
use crate::provider::{AnalyticsProvider, ProviderError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// Replays queued results per operation and counts every call.
/// With nothing queued an operation answers `{"success": true, "data": {"op": <op>}}`.
#[derive(Default)]
pub struct MockProvider {
    queued: Mutex<HashMap<&'static str, VecDeque<Result<Value, ProviderError>>>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    queries: Mutex<Vec<TxQuery>>,
    delay: Option<Duration>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn push(&self, op: &'static str, result: Result<Value, ProviderError>) {
        self.queued
            .lock()
            .unwrap()
            .entry(op)
            .or_default()
            .push_back(result);
    }

    pub fn calls(&self, op: &str) -> usize {
        self.calls.lock().unwrap().get(op).copied().unwrap_or(0)
    }

    pub fn tx_queries(&self) -> Vec<TxQuery> {
        self.queries.lock().unwrap().clone()
    }

    async fn answer(&self, op: &'static str) -> Result<Value, ProviderError> {
        *self.calls.lock().unwrap().entry(op).or_insert(0) += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self
            .queued
            .lock()
            .unwrap()
            .get_mut(op)
            .and_then(VecDeque::pop_front);
        next.unwrap_or_else(|| Ok(json!({ "success": true, "data": { "op": op } })))
    }
}

#[async_trait]
impl AnalyticsProvider for MockProvider {
    async fn status(&self) -> Result<Value, ProviderError> {
        self.answer("status").await
    }

    async fn address_labels(&self, _coin: Coin, _address: &str) -> Result<Value, ProviderError> {
        self.answer("labels").await
    }

    async fn address_overview(&self, _coin: Coin, _address: &str) -> Result<Value, ProviderError> {
        self.answer("overview").await
    }

    async fn risk_score(&self, _coin: Coin, _target: &RiskTarget) -> Result<Value, ProviderError> {
        self.answer("risk_score").await
    }

    async fn transactions_investigation(
        &self,
        _coin: Coin,
        _address: &str,
        query: &TxQuery,
    ) -> Result<Value, ProviderError> {
        self.queries.lock().unwrap().push(query.clone());
        self.answer("transactions").await
    }

    async fn address_actions(&self, _coin: Coin, _address: &str) -> Result<Value, ProviderError> {
        self.answer("actions").await
    }

    async fn address_profile(&self, _coin: Coin, _address: &str) -> Result<Value, ProviderError> {
        self.answer("profile").await
    }
}

/// Renders every graph to the same fake PNG and remembers what it was given
#[derive(Default)]
pub struct StaticRenderer {
    pub rendered: Mutex<Vec<Vec<Edge>>>,
}

pub const FAKE_PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake";

#[async_trait]
impl GraphRenderer for StaticRenderer {
    async fn render(&self, edges: &[Edge]) -> Result<RenderedGraph, RenderError> {
        if edges.is_empty() {
            return Err(RenderError::Empty);
        }
        self.rendered.lock().unwrap().push(edges.to_vec());
        Ok(RenderedGraph {
            png: FAKE_PNG.to_vec(),
        })
    }
}

/// A transaction-history response with the given records
pub fn tx_response(records: Vec<Value>) -> Value {
    json!({ "success": true, "data": { "transactions": records } })
}

pub fn tx_record(hash: &str, from: &str, to: &str, value: f64, ts: &str) -> Value {
    json!({
        "hash": hash,
        "from_address": from,
        "to_address": to,
        "value": value,
        "timestamp": ts,
    })
}

pub const ETH_ADDRESS: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";
pub const ETH_ADDRESS_2: &str = "0x00000000219ab540356cBB839Cbe05303d7705Fa";
pub const BTC_ADDRESS: &str = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";
