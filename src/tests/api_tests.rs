#[cfg(test)]
mod tests {
    use crate::{
        api::create_router,
        config::Config,
        service::{session::ArtifactBackend, SessionRegistry},
        state::AppState,
        tests::mock::{tx_record, tx_response, MockProvider, StaticRenderer, BTC_ADDRESS, ETH_ADDRESS, FAKE_PNG},
    };
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        Router,
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> (Arc<MockProvider>, Router) {
        let provider = Arc::new(MockProvider::new());
        let sessions = SessionRegistry::new(
            provider.clone(),
            Arc::new(StaticRenderer::default()),
            ArtifactBackend::Memory,
        );
        let state = Arc::new(AppState {
            config: Config::default(),
            sessions,
        });
        (provider, create_router(state))
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    async fn call_json(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = call(app, method, uri, body).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn new_session(app: &Router) -> String {
        let (status, body) = call_json(app, "POST", "/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        body["data"]["sessionId"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_create_and_close_session() {
        let (_, app) = app();
        let id = new_session(&app).await;

        let (status, _) = call(&app, "DELETE", &format!("/sessions/{}", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = call_json(&app, "DELETE", &format!("/sessions/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains(&id));

        let (status, _) = call(&app, "GET", &format!("/sessions/{}/summary", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_or_malformed_session() {
        let (_, app) = app();
        let (status, _) = call(
            &app,
            "GET",
            "/sessions/00000000-0000-0000-0000-000000000000/summary",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = call_json(&app, "GET", "/sessions/not-a-uuid/summary", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("not-a-uuid"));
    }

    #[tokio::test]
    async fn test_parameter_validation() {
        let (provider, app) = app();
        let id = new_session(&app).await;

        let cases = [
            format!("/sessions/{}/labels?address={}", id, ETH_ADDRESS),
            format!("/sessions/{}/labels?coin=DOGE&address={}", id, ETH_ADDRESS),
            format!("/sessions/{}/labels?coin=ETH&address=0x123", id),
            format!("/sessions/{}/overview?coin=ETH&address={}", id, BTC_ADDRESS),
            format!("/sessions/{}/risk_score?coin=ETH", id),
            format!("/sessions/{}/risk_score?coin=ETH&address={}&txid=0xabc", id, ETH_ADDRESS),
            format!("/sessions/{}/transactions?coin=ETH&address={}&page=0", id, ETH_ADDRESS),
            format!("/sessions/{}/transactions?coin=ETH&address={}&tx_type=sideways", id, ETH_ADDRESS),
            format!(
                "/sessions/{}/transactions?coin=ETH&address={}&start_timestamp=20&end_timestamp=10",
                id, ETH_ADDRESS
            ),
        ];
        for uri in cases {
            let (status, body) = call_json(&app, "GET", &uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert!(body["error"].is_string(), "{}", uri);
        }

        for op in ["labels", "overview", "risk_score", "transactions"] {
            assert_eq!(provider.calls(op), 0);
        }
    }

    #[tokio::test]
    async fn test_zero_time_range_is_cacheable() {
        let (provider, app) = app();
        let id = new_session(&app).await;
        let uri = format!(
            "/sessions/{}/transactions?coin=ETH&address={}&start_timestamp=0&end_timestamp=0",
            id, ETH_ADDRESS
        );

        let (status, _) = call_json(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, second) = call_json(&app, "GET", &uri, None).await;
        assert_eq!(second["data"]["fromCache"], json!(true));
        assert_eq!(provider.calls("transactions"), 1);
    }

    #[tokio::test]
    async fn test_lookup_served_from_cache_on_repeat() {
        let (provider, app) = app();
        let id = new_session(&app).await;
        let uri = format!("/sessions/{}/labels?coin=eth&address={}", id, ETH_ADDRESS);

        let (status, first) = call_json(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(first["data"].get("fromCache").is_none());

        let (_, second) = call_json(&app, "GET", &uri, None).await;
        assert_eq!(second["data"]["fromCache"], json!(true));
        assert_eq!(provider.calls("labels"), 1);
    }

    #[tokio::test]
    async fn test_provider_errors_returned_as_data() {
        let (provider, app) = app();
        provider.push("overview", Err(crate::provider::ProviderError::MissingApiKey));
        let id = new_session(&app).await;

        let (status, body) = call_json(
            &app,
            "GET",
            &format!("/sessions/{}/overview?coin=ETH&address={}", id, ETH_ADDRESS),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["data"],
            json!({"error": "MISTTRACK_API_KEY environment variable not set."})
        );
    }

    #[tokio::test]
    async fn test_transactions_graph_artifact_flow() {
        let (provider, app) = app();
        provider.push(
            "transactions",
            Ok(tx_response(vec![
                tx_record("0x1", ETH_ADDRESS, "0xbbb", 1.0, "2024-01-01"),
                tx_record("0x2", "0xbbb", "0xccc", 2.0, "2024-01-02"),
            ])),
        );
        let id = new_session(&app).await;

        let (status, txs) = call_json(
            &app,
            "GET",
            &format!("/sessions/{}/transactions?coin=ETH&address={}&tx_type=all&page=1", id, ETH_ADDRESS),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(txs["data"]["dataStoredForGraph"], json!(true));
        assert_eq!(txs["data"]["graphEdgeCount"], json!(2));

        let (_, edges) = call_json(&app, "GET", &format!("/sessions/{}/graph/edges", id), None).await;
        assert_eq!(edges["data"].as_array().unwrap().len(), 2);
        assert_eq!(edges["data"][0]["from"], json!(ETH_ADDRESS));

        let (status, report) = call_json(&app, "POST", &format!("/sessions/{}/graph", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["data"]["edgeCount"], json!(2));
        assert_eq!(report["data"]["placeholder"], json!(false));
        assert!(report["data"]["markdown"]
            .as_str()
            .unwrap()
            .starts_with("![Transaction graph](data:image/png;base64,"));
        let artifact_id = report["data"]["artifactId"].as_str().unwrap().to_string();

        let (status, png) = call(
            &app,
            "GET",
            &format!("/sessions/{}/artifacts/{}", id, artifact_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(png, FAKE_PNG);

        let (_, summary) = call_json(&app, "GET", &format!("/sessions/{}/summary", id), None).await;
        assert_eq!(
            summary["data"],
            json!({
                "addressesInvestigated": [ETH_ADDRESS],
                "transactionsAnalyzed": ["0x1", "0x2"],
                "cacheSize": 1,
                "stateKeys": [],
                "artifactIds": [artifact_id],
            })
        );
    }

    #[tokio::test]
    async fn test_render_custom_edges() {
        let (_, app) = app();
        let id = new_session(&app).await;

        let (status, report) = call_json(
            &app,
            "POST",
            &format!("/sessions/{}/graph", id),
            Some(json!({"edges": [{"from": "a", "to": "b", "value": "1", "ts": "t"}]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["data"]["edgeCount"], json!(1));

        let (status, _) = call(
            &app,
            "POST",
            &format!("/sessions/{}/graph", id),
            Some(json!({"edges": "nope"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_empty_graph_renders_placeholder() {
        let (_, app) = app();
        let id = new_session(&app).await;

        let (_, report) = call_json(&app, "POST", &format!("/sessions/{}/graph", id), None).await;
        assert_eq!(report["data"]["placeholder"], json!(true));
        assert_eq!(report["data"]["edgeCount"], json!(0));
    }

    #[tokio::test]
    async fn test_unknown_artifact_is_not_found() {
        let (_, app) = app();
        let id = new_session(&app).await;
        let (status, _) = call(
            &app,
            "GET",
            &format!("/sessions/{}/artifacts/{}", id, uuid::Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_shared_state_and_clear() {
        let (_, app) = app();
        let id = new_session(&app).await;

        let (status, _) = call(
            &app,
            "PUT",
            &format!("/sessions/{}/state/suspects", id),
            Some(json!(["0xaaa", "0xbbb"])),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, entry) = call_json(&app, "GET", &format!("/sessions/{}/state/suspects", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(entry["data"]["value"], json!(["0xaaa", "0xbbb"]));
        assert!(entry["data"]["lastUpdated"].is_string());

        call(
            &app,
            "GET",
            &format!("/sessions/{}/labels?coin=ETH&address={}", id, ETH_ADDRESS),
            None,
        )
        .await;

        let (status, _) = call(&app, "POST", &format!("/sessions/{}/clear", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = call(&app, "GET", &format!("/sessions/{}/state/suspects", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, summary) = call_json(&app, "GET", &format!("/sessions/{}/summary", id), None).await;
        assert_eq!(summary["data"]["cacheSize"], json!(0));
        assert_eq!(summary["data"]["addressesInvestigated"], json!([]));
    }

    #[tokio::test]
    async fn test_status_passthrough() {
        let (provider, app) = app();
        provider.push("status", Ok(json!({"success": true, "msg": "ok"})));

        let (status, body) = call_json(&app, "GET", "/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["msg"], json!("ok"));
        assert_eq!(provider.calls("status"), 1);
    }
}
