//! pulseboard-api — REST API for Pulseboard.
//!
//! Stateless axum handlers translating HTTP requests into metric store
//! operations. Cross-origin requests are allowed from anywhere.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/metrics` | Up to 100 most recent metrics, newest first |
//! | POST | `/metrics` | Record a metric |
//! | DELETE | `/metrics/:id` | Delete a metric |

pub mod error;
pub mod handlers;

use axum::Router;
use axum::routing::{delete, get};
use pulseboard_store::MetricStore;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: MetricStore,
}

/// Build the metrics API router.
pub fn build_router(store: MetricStore) -> Router {
    let api_state = ApiState { store };

    Router::new()
        .route("/metrics", get(handlers::list_metrics).post(handlers::create_metric))
        .route("/metrics/{id}", delete(handlers::delete_metric))
        .with_state(api_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
