use crate::{
    api::{
        error::ApiError,
        response::{png, ApiResponse},
    },
    models::{Coin, Edge, TxQuery},
    provider::AnalyticsProvider,
    service::InvestigationSession,
    state::AppState,
    validation::{
        validate_address, validate_coin, validate_page, validate_risk_target, validate_timestamp,
        validate_tx_type,
    },
};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use uuid::Uuid;

// Address-scoped lookup query parameters
#[derive(Deserialize)]
pub struct AddressQuery {
    coin: Option<String>,
    address: Option<String>,
}

// GET /risk_score query parameters
#[derive(Deserialize)]
pub struct RiskQuery {
    coin: Option<String>,
    address: Option<String>,
    txid: Option<String>,
}

// GET /transactions query parameters
#[derive(Deserialize)]
pub struct TransactionsQuery {
    coin: Option<String>,
    address: Option<String>,
    tx_type: Option<String>,
    page: Option<String>,
    start_timestamp: Option<String>,
    end_timestamp: Option<String>,
}

// POST /graph body
#[derive(Deserialize, Default)]
pub struct RenderRequest {
    edges: Option<Vec<Edge>>,
}

#[derive(Clone, Copy)]
enum AddressLookup {
    Labels,
    Overview,
    Actions,
    Profile,
}

// Create router with all routes
pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/status", get(api_status))
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", axum::routing::delete(close_session))
        .route("/sessions/{id}/labels", get(address_labels))
        .route("/sessions/{id}/overview", get(address_overview))
        .route("/sessions/{id}/actions", get(address_actions))
        .route("/sessions/{id}/profile", get(address_profile))
        .route("/sessions/{id}/risk_score", get(risk_score))
        .route("/sessions/{id}/transactions", get(transactions))
        .route("/sessions/{id}/transactions/raw", get(raw_transactions))
        .route("/sessions/{id}/summary", get(summary))
        .route("/sessions/{id}/graph", post(render_graph))
        .route("/sessions/{id}/graph/edges", get(graph_edges))
        .route("/sessions/{id}/artifacts/{artifact_id}", get(artifact))
        .route("/sessions/{id}/state/{key}", get(get_state).put(put_state))
        .route("/sessions/{id}/clear", post(clear_session))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

fn parse_id(kind: &str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::InvalidParameter(format!("Invalid {} id: {}", kind, raw)))
}

async fn session(state: &AppState, raw_id: &str) -> Result<Arc<InvestigationSession>, ApiError> {
    let id = parse_id("session", raw_id)?;
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Session {}", id)))
}

fn coin_and_address(coin: Option<&str>, address: Option<&str>) -> Result<(Coin, String), ApiError> {
    let coin = validate_coin(coin)?;
    let address = validate_address(coin, address)?;
    Ok((coin, address))
}

// GET /status handler
async fn api_status(State(state): State<Arc<AppState>>) -> Response {
    let status = state
        .sessions
        .provider()
        .status()
        .await
        .unwrap_or_else(|e| e.into_payload());
    ApiResponse { data: status }.into_response()
}

// POST /sessions handler
async fn create_session(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let session = state.sessions.create().await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "data": { "sessionId": session.id } })),
    )
        .into_response())
}

// DELETE /sessions/{id} handler
async fn close_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id("session", &id)?;
    if state.sessions.close(id).await {
        Ok(StatusCode::NO_CONTENT.into_response())
    } else {
        Err(ApiError::NotFound(format!("Session {}", id)))
    }
}

async fn address_lookup(
    state: &AppState,
    id: &str,
    params: AddressQuery,
    lookup: AddressLookup,
) -> Result<Response, ApiError> {
    let session = session(state, id).await?;
    let (coin, address) = coin_and_address(params.coin.as_deref(), params.address.as_deref())?;

    let lookups = &session.lookups;
    let data = match lookup {
        AddressLookup::Labels => lookups.address_labels(coin, &address).await,
        AddressLookup::Overview => lookups.address_overview(coin, &address).await,
        AddressLookup::Actions => lookups.address_actions(coin, &address).await,
        AddressLookup::Profile => lookups.address_profile(coin, &address).await,
    };
    Ok(ApiResponse { data }.into_response())
}

async fn address_labels(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<AddressQuery>,
) -> Result<Response, ApiError> {
    address_lookup(&state, &id, params, AddressLookup::Labels).await
}

async fn address_overview(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<AddressQuery>,
) -> Result<Response, ApiError> {
    address_lookup(&state, &id, params, AddressLookup::Overview).await
}

async fn address_actions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<AddressQuery>,
) -> Result<Response, ApiError> {
    address_lookup(&state, &id, params, AddressLookup::Actions).await
}

async fn address_profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<AddressQuery>,
) -> Result<Response, ApiError> {
    address_lookup(&state, &id, params, AddressLookup::Profile).await
}

// GET /risk_score handler
async fn risk_score(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<RiskQuery>,
) -> Result<Response, ApiError> {
    let session = session(&state, &id).await?;
    let coin = validate_coin(params.coin.as_deref())?;
    let target = validate_risk_target(coin, params.address.as_deref(), params.txid.as_deref())?;

    let data = session.lookups.risk_score(coin, &target).await;
    Ok(ApiResponse { data }.into_response())
}

struct ValidatedTransactions {
    coin: Coin,
    address: String,
    query: TxQuery,
}

fn validate_transactions(params: &TransactionsQuery) -> Result<ValidatedTransactions, ApiError> {
    let (coin, address) = coin_and_address(params.coin.as_deref(), params.address.as_deref())?;
    let tx_type = validate_tx_type(params.tx_type.as_deref())?;
    let page = validate_page(params.page.as_deref())?;
    let start = validate_timestamp("start_timestamp", params.start_timestamp.as_deref())?;
    let end = validate_timestamp("end_timestamp", params.end_timestamp.as_deref())?;

    let query = TxQuery::page(tx_type, page).with_time_range(start, end);
    if let (Some(start), Some(end)) = query.time_range() {
        if start >= end {
            return Err(ApiError::InvalidParameter(
                "start_timestamp must be less than end_timestamp".to_string(),
            ));
        }
    }

    Ok(ValidatedTransactions {
        coin,
        address,
        query,
    })
}

// GET /transactions handler
async fn transactions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<TransactionsQuery>,
) -> Result<Response, ApiError> {
    let session = session(&state, &id).await?;
    let ValidatedTransactions { coin, address, query } = validate_transactions(&params)?;

    info!(
        "Fetching transactions for {} {}, type: {}, page: {}, time range: {:?}",
        coin, address, query.tx_type, query.page, query.time_range()
    );

    let data = session
        .lookups
        .transactions_and_store(coin, &address, &query)
        .await;
    Ok(ApiResponse { data }.into_response())
}

// GET /transactions/raw handler
async fn raw_transactions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<TransactionsQuery>,
) -> Result<Response, ApiError> {
    let session = session(&state, &id).await?;
    let ValidatedTransactions { coin, address, query } = validate_transactions(&params)?;

    let data = session
        .lookups
        .transactions_investigation(coin, &address, &query)
        .await;
    Ok(ApiResponse { data }.into_response())
}

// GET /summary handler
async fn summary(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let session = session(&state, &id).await?;
    let data = session.lookups.investigation_summary().await;
    Ok(ApiResponse { data }.into_response())
}

// POST /graph handler
async fn render_graph(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let session = session(&state, &id).await?;
    let request: RenderRequest = if body.is_empty() {
        RenderRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid graph request: {}", e)))?
    };

    let report = session
        .graphs
        .render_stored_graph(request.edges)
        .await
        .map_err(|e| {
            error!("Failed to render graph for session {}: {}", id, e);
            ApiError::from(e)
        })?;
    Ok(ApiResponse { data: report }.into_response())
}

// GET /graph/edges handler
async fn graph_edges(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let session = session(&state, &id).await?;
    let data = session.cache.current_graph_data().await;
    Ok(ApiResponse { data }.into_response())
}

// GET /artifacts/{artifact_id} handler
async fn artifact(
    State(state): State<Arc<AppState>>,
    Path((id, artifact_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let session = session(&state, &id).await?;
    let artifact_id = parse_id("artifact", &artifact_id)?;

    match session.cache.load_artifact(artifact_id).await? {
        Some(bytes) => Ok(png(bytes)),
        None => Err(ApiError::NotFound(format!("Artifact {}", artifact_id))),
    }
}

// GET /state/{key} handler
async fn get_state(
    State(state): State<Arc<AppState>>,
    Path((id, key)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let session = session(&state, &id).await?;
    match session.cache.get_entry(&key).await {
        Some(entry) => Ok(ApiResponse {
            data: json!({
                "key": key,
                "value": entry.value,
                "lastUpdated": entry.last_updated,
            }),
        }
        .into_response()),
        None => Err(ApiError::NotFound(format!("State key {}", key))),
    }
}

// PUT /state/{key} handler
async fn put_state(
    State(state): State<Arc<AppState>>,
    Path((id, key)): Path<(String, String)>,
    Json(value): Json<Value>,
) -> Result<Response, ApiError> {
    let session = session(&state, &id).await?;
    session.cache.put(&key, value).await;
    Ok(StatusCode::NO_CONTENT.into_response())
}

// POST /clear handler
async fn clear_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let session = session(&state, &id).await?;
    session.cache.clear().await;
    info!("Cleared investigation session {}", session.id);
    Ok(StatusCode::NO_CONTENT.into_response())
}
