//! fleetgrid-api: the REST surface over the core services.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/api/v1/sensors/data` | Ingest a sensor reading |
//! | GET | `/api/v1/throughput` | Current observed throughput |
//! | GET | `/api/v1/scaling/recommendation` | Scaling recommendation |
//! | GET | `/api/v1/workers` | List registered workers |
//! | POST | `/api/v1/workers` | Register a worker |
//! | DELETE | `/api/v1/workers/{worker_id}` | Deregister a worker |
//! | PUT | `/api/v1/workers/{worker_id}/health` | Report worker health |

pub mod handlers;

use axum::Router;
use axum::routing::{delete, get, post, put};

use fleetgrid_autoscale::Recommender;
use fleetgrid_registry::WorkerRegistry;
use fleetgrid_throughput::ThroughputEstimator;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub estimator: ThroughputEstimator,
    pub registry: WorkerRegistry,
    pub recommender: Recommender,
}

/// Build the complete API router.
pub fn build_router(state: ApiState) -> Router {
    let api_routes = Router::new()
        .route("/sensors/data", post(handlers::ingest_reading))
        .route("/throughput", get(handlers::get_throughput))
        .route(
            "/scaling/recommendation",
            get(handlers::get_recommendation),
        )
        .route(
            "/workers",
            get(handlers::list_workers).post(handlers::register_worker),
        )
        .route("/workers/{worker_id}", delete(handlers::deregister_worker))
        .route(
            "/workers/{worker_id}/health",
            put(handlers::update_worker_health),
        )
        .with_state(state);

    Router::new().nest("/api/v1", api_routes)
}
