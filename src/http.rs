use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::config::Config;
use crate::features::ModelDomain;
use crate::scoring::{ScoreError, ScoringEngine};

/// HTTP API server - the service's only listener.
pub struct ApiServer {
    engine: Arc<ScoringEngine>,
    config: Arc<Config>,
}

#[derive(Clone)]
struct AppState {
    engine: Arc<ScoringEngine>,
}

#[derive(Deserialize)]
struct JournalQuery {
    domain: Option<String>,
    tier: Option<String>,
    limit: Option<usize>,
}

impl ApiServer {
    pub fn new(engine: Arc<ScoringEngine>, config: Arc<Config>) -> Self {
        Self { engine, config }
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let app = router(self.engine.clone(), self.config.listen.cors);

        let addr = format!("{}:{}", self.config.listen.address, self.config.listen.port);
        info!("🌐 riskd API listening on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;
        Ok(())
    }
}

/// Route table, separated from `run` so tests can serve it on an
/// ephemeral port.
pub fn router(engine: Arc<ScoringEngine>, cors: bool) -> Router {
    let state = AppState { engine };

    let mut app = Router::new()
        .route("/health", get(health))
        .route("/predict/supplier", post(predict_supplier))
        .route("/predict/shipment", post(predict_shipment))
        .route("/predict/inventory", post(predict_inventory))
        .route("/api/stats", get(api_stats))
        .route("/api/journal", get(api_journal))
        .route("/api/models", get(api_models))
        .route("/api/models/reload", post(api_models_reload))
        .with_state(state);

    if cors {
        app = app.layer(CorsLayer::permissive());
    }
    app
}

/// Health check - reports per-model load status
async fn health(State(state): State<AppState>) -> Json<Value> {
    let registry = &state.engine.registry;
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        "models": {
            "supplier": registry.status(ModelDomain::Supplier),
            "shipment": registry.status(ModelDomain::Shipment),
            "inventory": registry.status(ModelDomain::Inventory),
        },
    }))
}

async fn predict_supplier(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    predict(&state, ModelDomain::Supplier, payload)
}

async fn predict_shipment(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    predict(&state, ModelDomain::Shipment, payload)
}

async fn predict_inventory(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    predict(&state, ModelDomain::Inventory, payload)
}

fn predict(state: &AppState, domain: ModelDomain, payload: Result<Json<Value>, JsonRejection>) -> Response {
    // A body axum cannot parse keeps the same error shape as a
    // validation failure
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => {
            return (rejection.status(), Json(json!({ "detail": rejection.body_text() })))
                .into_response();
        }
    };
    match state.engine.predict(domain, &payload) {
        Ok(prediction) => Json(prediction).into_response(),
        Err(e) => error_response(e),
    }
}

/// Error bodies use the `{"detail": ...}` shape the frontend already
/// handles.
fn error_response(e: ScoreError) -> Response {
    let status = match e {
        ScoreError::Validation(_) => StatusCode::BAD_REQUEST,
        ScoreError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(json!({ "detail": e.to_string() }))).into_response()
}

/// Engine counters API
async fn api_stats(State(state): State<AppState>) -> Json<Value> {
    Json(state.engine.get_stats())
}

/// Prediction journal API with search
async fn api_journal(
    State(state): State<AppState>,
    Query(params): Query<JournalQuery>,
) -> Json<Value> {
    let limit = params.limit.unwrap_or(100);
    let entries = state.engine.journal.search(
        params.domain.as_deref(),
        params.tier.as_deref(),
        limit,
    );
    Json(json!({
        "entries": entries,
        "stats": state.engine.journal.get_stats(),
    }))
}

/// Per-domain artifact detail API
async fn api_models(State(state): State<AppState>) -> Json<Value> {
    Json(state.engine.registry.list_models())
}

/// Force an immediate artifact sweep
async fn api_models_reload(State(state): State<AppState>) -> Json<Value> {
    let report = state.engine.registry.sweep();
    info!("Manual model reload: {}", report);
    Json(json!({ "reloaded": report }))
}
