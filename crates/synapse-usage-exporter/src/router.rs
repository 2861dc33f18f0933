//! Axum router wiring.
//!
//! Report ingestion and scraping live on separate, configurable paths.

use axum::{
    routing::{get, put},
    Router,
};

use crate::{app_state::AppState, ops, transport};

pub fn build_router(state: AppState) -> Router {
    let push_path = state.cfg().server.push_path.clone();
    let metrics_path = state.cfg().server.metrics_path.clone();

    Router::new()
        .route(&push_path, put(transport::push::report_usage_stats))
        .route(&metrics_path, get(ops::metrics))
        .route("/healthz", get(ops::healthz))
        .with_state(state)
}
