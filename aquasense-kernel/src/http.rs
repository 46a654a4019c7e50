/**
 * API HTTP - Vues en lecture seule sur le data store capteurs
 *
 * RÔLE :
 * Alimente le dashboard : dernière lecture, historique récent, alertes récentes
 * et une lecture par site surveillé.
 *
 * FONCTIONNEMENT :
 * - Routeur Axum partageant le handle du store avec le scheduler
 * - Store vide : réponses null / [] plutôt que des erreurs
 * - Tout échec de handler (panics compris) devient 500 {"error": ...}
 * - CORS ouvert aux origines configurées, GET/POST/OPTIONS
 */

use axum::extract::{Query, State};
use axum::http::header::{ACCEPT, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};
use serde_json::json;
use std::any::Any;
use std::collections::HashMap;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::config::CorsConf;
use crate::health::{HealthTracker, KernelHealth};
use crate::models::{Alert, Reading};
use crate::scenarios;
use crate::store::{SharedStore, DEFAULT_ALERT_LIMIT, DEFAULT_HISTORY_LIMIT};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    HandlerFailure(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::HandlerFailure(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self, "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub health: HealthTracker,
}

pub fn build_router(app_state: AppState, cors: &CorsConf) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route("/health", get(|| async { "ok" }))
        .route("/api/health", get(get_health))
        .route("/api/latest", get(get_latest))
        .route("/api/historical", get(get_historical))
        .route("/api/alerts", get(get_alerts))
        .route("/api/all-locations", get(get_all_locations))
        .with_state(app_state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(cors))
}

pub fn build_cors_layer(conf: &CorsConf) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([ACCEPT, CONTENT_TYPE, AUTHORIZATION, CACHE_CONTROL])
        .expose_headers([CONTENT_TYPE]);

    if conf.allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(AnyOrigin);
    }

    let origins: Vec<HeaderValue> = conf
        .allowed_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(origin = %o, error = %e, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    ApiError::HandlerFailure(detail).into_response()
}

/// `?limit=N` ; absent ou illisible = `default`, 0 = tout.
fn limit_param(params: &HashMap<String, String>, default: usize) -> usize {
    params
        .get("limit")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

// GET /
async fn service_info() -> Json<serde_json::Value> {
    Json(json!({
        "name": "Water Quality Sensor API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/api/latest",
            "/api/historical",
            "/api/alerts",
            "/api/all-locations",
            "/api/health",
        ],
    }))
}

// GET /api/health
async fn get_health(State(app): State<AppState>) -> Json<KernelHealth> {
    Json(app.health.get_health(&app.store))
}

// GET /api/latest (null tant qu'aucun tick n'a tourné)
async fn get_latest(State(app): State<AppState>) -> Json<Option<Reading>> {
    Json(app.store.get_latest())
}

// GET /api/historical?limit=N
async fn get_historical(
    State(app): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Vec<Reading>> {
    let limit = limit_param(&params, DEFAULT_HISTORY_LIMIT);
    Json(app.store.get_history(limit))
}

// GET /api/alerts?limit=N
async fn get_alerts(
    State(app): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Vec<Alert>> {
    let limit = limit_param(&params, DEFAULT_ALERT_LIMIT);
    Json(app.store.get_alerts(limit))
}

// GET /api/all-locations
async fn get_all_locations(
    State(app): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let view = app.store.latest_by_location(scenarios::all().len());

    Ok(Json(json!({
        "count": view.locations.len(),
        "locations": serde_json::to_value(&view.locations)?,
        "timestamp": view.timestamp,
    })))
}
