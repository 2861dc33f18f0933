//! Operational HTTP endpoints.
//!
//! - `/healthz` : liveness
//! - `/metrics` : Prometheus text format (usage gauges, build info, self-metrics)

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::app_state::AppState;
use crate::obs::exposition;

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Render the full scrape body.
pub fn render_metrics(state: &AppState) -> String {
    let registry = state.registry();
    let mut out = String::new();
    exposition::render_usage(&registry.snapshot(), registry.schema(), &mut out);
    exposition::render_build_info(registry.build_info(), &mut out);
    state.metrics().render(&mut out);
    out
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    let body = render_metrics(&state);

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, exposition::CONTENT_TYPE)],
        body,
    )
        .into_response()
}
