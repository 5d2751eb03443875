//! REST API handlers.
//!
//! Success responses carry the domain object directly; failures carry a
//! structured error body. Store unavailability maps to 503 so callers
//! know the operation is retryable.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use fleetgrid_registry::{RegistryError, WorkerRecord};

use crate::ApiState;

/// Structured error body (timestamp, status, error, message, path).
#[derive(serde::Serialize)]
struct ErrorBody {
    timestamp: u64,
    status: u16,
    error: String,
    message: String,
    path: String,
}

fn error_response(status: StatusCode, message: &str, path: &str) -> Response {
    let body = ErrorBody {
        timestamp: epoch_secs(),
        status: status.as_u16(),
        error: status
            .canonical_reason()
            .unwrap_or("unknown")
            .to_string(),
        message: message.to_string(),
        path: path.to_string(),
    };
    (status, Json(body)).into_response()
}

fn registry_error_response(err: &RegistryError, path: &str) -> Response {
    match err {
        RegistryError::InvalidInput(_) => {
            error_response(StatusCode::BAD_REQUEST, &err.to_string(), path)
        }
        RegistryError::Unavailable(_) => {
            error_response(StatusCode::SERVICE_UNAVAILABLE, &err.to_string(), path)
        }
        RegistryError::Codec(_) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string(), path)
        }
    }
}

// ── Ingestion ──────────────────────────────────────────────────

/// A sensor reading. Only counted; the payload itself is handed to the
/// external time-series collaborator and not persisted here.
#[derive(serde::Deserialize)]
pub struct SensorReading {
    pub sensor_id: String,
    pub readings: HashMap<String, f64>,
    pub timestamp: Option<u64>,
    pub metadata: Option<HashMap<String, String>>,
}

/// POST /api/v1/sensors/data
pub async fn ingest_reading(
    State(state): State<ApiState>,
    Json(reading): Json<SensorReading>,
) -> impl IntoResponse {
    if reading.sensor_id.trim().is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "sensor id must not be blank",
            "/api/v1/sensors/data",
        );
    }
    tracing::trace!(sensor_id = %reading.sensor_id, "reading ingested");
    state.estimator.record_event();
    StatusCode::CREATED.into_response()
}

// ── Throughput ─────────────────────────────────────────────────

/// GET /api/v1/throughput
pub async fn get_throughput(State(state): State<ApiState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "current_throughput": state.estimator.current_rate()
    }))
}

// ── Scaling ────────────────────────────────────────────────────

/// GET /api/v1/scaling/recommendation
pub async fn get_recommendation(State(state): State<ApiState>) -> impl IntoResponse {
    match state.recommender.recommend() {
        Ok(rec) => Json(rec).into_response(),
        Err(e) => registry_error_response(&e, "/api/v1/scaling/recommendation"),
    }
}

// ── Workers ────────────────────────────────────────────────────

/// Registration request body.
#[derive(serde::Deserialize)]
pub struct RegisterWorkerRequest {
    pub worker_id: String,
}

/// POST /api/v1/workers
pub async fn register_worker(
    State(state): State<ApiState>,
    Json(req): Json<RegisterWorkerRequest>,
) -> impl IntoResponse {
    match state.registry.register(WorkerRecord::new(req.worker_id)) {
        Ok(record) => Json(record).into_response(),
        Err(e) => registry_error_response(&e, "/api/v1/workers"),
    }
}

/// GET /api/v1/workers
pub async fn list_workers(State(state): State<ApiState>) -> impl IntoResponse {
    match state.registry.list_all() {
        Ok(workers) => Json(workers).into_response(),
        Err(e) => registry_error_response(&e, "/api/v1/workers"),
    }
}

/// DELETE /api/v1/workers/{worker_id}
pub async fn deregister_worker(
    State(state): State<ApiState>,
    Path(worker_id): Path<String>,
) -> impl IntoResponse {
    let path = format!("/api/v1/workers/{worker_id}");
    match state.registry.deregister(&worker_id) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => registry_error_response(&e, &path),
    }
}

/// Health report body. A missing count reads as zero, matching what
/// freshly-started workers send.
#[derive(serde::Deserialize)]
pub struct HealthReport {
    #[serde(default)]
    pub processed_count: Option<u64>,
}

/// PUT /api/v1/workers/{worker_id}/health
pub async fn update_worker_health(
    State(state): State<ApiState>,
    Path(worker_id): Path<String>,
    Json(report): Json<HealthReport>,
) -> impl IntoResponse {
    let path = format!("/api/v1/workers/{worker_id}/health");
    let processed_count = report.processed_count.unwrap_or(0);
    match state.registry.update_health(&worker_id, processed_count) {
        Ok(Some(record)) => Json(record).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "worker not found", &path),
        Err(e) => registry_error_response(&e, &path),
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
