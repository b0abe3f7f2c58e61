//! Normalizes a raw transaction-history response into graph edges.
//!
//! Each record is judged on its own: a record missing one of the edge fields
//! is skipped with a reason, and never aborts the rest of the batch. The
//! transaction hash is extracted independently of edge completeness, so a
//! skipped record can still be reported as analyzed.

use crate::models::Edge;
use serde_json::Value;
use tracing::debug;

const FROM: &str = "from_address";
const TO: &str = "to_address";
const VALUE: &str = "value";
const TIME: &str = "timestamp";
const HASH: &str = "hash";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NotAnObject,
    MissingField(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Included,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordReport {
    pub index: usize,
    pub hash: Option<String>,
    pub outcome: RecordOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transformed {
    pub edges: Vec<Edge>,
    /// Hashes of every record that carried one, included or not
    pub txids: Vec<String>,
    pub records: Vec<RecordReport>,
}

impl Transformed {
    pub fn skipped(&self) -> impl Iterator<Item = &RecordReport> {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, RecordOutcome::Skipped(_)))
    }
}

/// The `data.transactions` array of a response, if there is one
pub fn transaction_records(raw: &Value) -> Option<&Vec<Value>> {
    raw.get("data")
        .and_then(|data| data.get("transactions"))
        .and_then(Value::as_array)
}

pub fn transform(raw: &Value) -> Transformed {
    let mut out = Transformed::default();

    let Some(records) = transaction_records(raw) else {
        debug!("Response has no transactions container, nothing to transform");
        return out;
    };

    for (index, record) in records.iter().enumerate() {
        let hash = field_string(record, HASH);
        if let Some(hash) = &hash {
            out.txids.push(hash.clone());
        }

        let outcome = match edge_from_record(record) {
            Ok(edge) => {
                out.edges.push(edge);
                RecordOutcome::Included
            }
            Err(reason) => {
                debug!("Skipping transaction record {}: {:?}", index, reason);
                RecordOutcome::Skipped(reason)
            }
        };

        out.records.push(RecordReport { index, hash, outcome });
    }

    debug!(
        "Transformed {} records into {} edges",
        out.records.len(),
        out.edges.len()
    );
    out
}

fn edge_from_record(record: &Value) -> Result<Edge, SkipReason> {
    if !record.is_object() {
        return Err(SkipReason::NotAnObject);
    }

    for field in [FROM, TO, VALUE, TIME] {
        if present(record, field).is_none() {
            return Err(SkipReason::MissingField(field));
        }
    }

    Ok(Edge {
        from: field_string(record, FROM).unwrap_or_default(),
        to: field_string(record, TO).unwrap_or_default(),
        value: field_string(record, VALUE).unwrap_or_else(|| "0".to_string()),
        timestamp: field_string(record, TIME).unwrap_or_default(),
    })
}

fn present<'a>(record: &'a Value, field: &str) -> Option<&'a Value> {
    record.get(field).filter(|v| !v.is_null())
}

/// Display form of a field: strings verbatim, anything else as JSON text
fn field_string(record: &Value, field: &str) -> Option<String> {
    present(record, field).map(|v| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}
