#[cfg(test)]
mod tests {
    use crate::{
        graph::{
            to_dot,
            transform::{transform, RecordOutcome, SkipReason},
        },
        models::Edge,
        tests::mock::{tx_record, tx_response},
    };
    use serde_json::{json, Value};

    #[test]
    fn test_absent_or_unexpected_shapes_yield_nothing() {
        for raw in [
            Value::Null,
            json!({}),
            json!({"error": "MISTTRACK_API_KEY environment variable not set."}),
            json!({"data": {}}),
            json!({"data": {"transactions": "not a list"}}),
            json!({"data": []}),
        ] {
            let out = transform(&raw);
            assert!(out.edges.is_empty(), "edges for {}", raw);
            assert!(out.txids.is_empty());
            assert!(out.records.is_empty());
        }
    }

    #[test]
    fn test_incomplete_records_skipped_but_hashes_recorded() {
        let mut records: Vec<Value> = (0..3)
            .map(|i| tx_record(&format!("0x{}", i), "0xaaa", "0xbbb", 1.0 + i as f64, "2024-01-01 00:00:00"))
            .collect();
        for i in 3..5 {
            records.push(json!({
                "hash": format!("0x{}", i),
                "from_address": "0xaaa",
                "value": 1,
                "timestamp": "2024-01-02 00:00:00",
            }));
        }

        let out = transform(&tx_response(records));

        assert_eq!(out.edges.len(), 3);
        assert_eq!(out.txids.len(), 5);
        assert_eq!(out.records.len(), 5);

        let skipped: Vec<_> = out.skipped().collect();
        assert_eq!(skipped.len(), 2);
        for report in skipped {
            assert_eq!(
                report.outcome,
                RecordOutcome::Skipped(SkipReason::MissingField("to_address"))
            );
            assert!(report.hash.is_some());
        }
    }

    #[test]
    fn test_edge_fields_coerced_to_strings() {
        let raw = tx_response(vec![json!({
            "hash": "0xfeed",
            "from_address": "0xaaa",
            "to_address": "0xbbb",
            "value": 1.5,
            "timestamp": 1700000000,
        })]);

        let out = transform(&raw);
        assert_eq!(out.edges, vec![Edge::new("0xaaa", "0xbbb", "1.5", "1700000000")]);
        assert_eq!(out.records[0].outcome, RecordOutcome::Included);
    }

    #[test]
    fn test_bad_record_does_not_abort_batch() {
        let raw = tx_response(vec![
            json!("garbage"),
            json!(42),
            json!({"hash": "0x1", "from_address": null, "to_address": "0xb", "value": "2", "timestamp": "t"}),
            tx_record("0x2", "0xa", "0xb", 3.0, "t"),
        ]);

        let out = transform(&raw);
        assert_eq!(out.edges.len(), 1);
        assert_eq!(out.edges[0].value, "3.0");
        assert_eq!(out.records[0].outcome, RecordOutcome::Skipped(SkipReason::NotAnObject));
        assert_eq!(out.records[1].outcome, RecordOutcome::Skipped(SkipReason::NotAnObject));
        assert_eq!(
            out.records[2].outcome,
            RecordOutcome::Skipped(SkipReason::MissingField("from_address"))
        );
        assert_eq!(out.txids, vec!["0x1".to_string(), "0x2".to_string()]);
    }

    #[test]
    fn test_records_without_hash_are_not_reported() {
        let raw = tx_response(vec![json!({
            "from_address": "0xa",
            "to_address": "0xb",
            "value": "5",
            "timestamp": "t",
        })]);

        let out = transform(&raw);
        assert_eq!(out.edges.len(), 1);
        assert!(out.txids.is_empty());
        assert_eq!(out.records[0].hash, None);
    }

    #[test]
    fn test_edges_keep_record_order() {
        let raw = tx_response(vec![
            tx_record("0x1", "a", "b", 1.0, "t1"),
            tx_record("0x2", "b", "c", 2.0, "t2"),
            tx_record("0x3", "c", "a", 3.0, "t3"),
        ]);
        let froms: Vec<_> = transform(&raw).edges.into_iter().map(|e| e.from).collect();
        assert_eq!(froms, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_dot_output() {
        let dot = to_dot(&[Edge::new("0xa", "0x\"b", "1.5", "2024-01-01")]);
        assert!(dot.starts_with("digraph {"));
        assert!(dot.contains("rankdir=LR"));
        assert!(dot.contains("\"0xa\" -> \"0x\\\"b\""));
        assert!(dot.contains("label=\"1.5\\n2024-01-01\""));
        assert!(dot.trim_end().ends_with('}'));
    }

    #[test]
    fn test_edge_accepts_short_timestamp_key() {
        let edge: Edge = serde_json::from_value(json!({
            "from": "a", "to": "b", "value": "1", "ts": "2024"
        }))
        .unwrap();
        assert_eq!(edge.timestamp, "2024");
    }
}
