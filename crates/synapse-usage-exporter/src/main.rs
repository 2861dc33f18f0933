//! synapse-usage-exporter
//!
//! - `PUT /report-usage-stats/push` : usage report from a homeserver
//! - `GET /metrics`                 : Prometheus scrape
//! - `GET /healthz`                 : liveness
//!
//! Startup failures (config, registry definition, bind) exit non-zero.

use std::process::ExitCode;

use synapse_usage_core::error::{Result, UsageError};
use synapse_usage_exporter::{app_state, config, obs, router};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "synapse-usage-exporter failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cfg = match config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            // Still report the failure through a default subscriber.
            let _ = obs::logging::init(&config::LogSection::default());
            return Err(e);
        }
    };
    obs::logging::init(&cfg.log)?;

    let listen = cfg.server.listen_addr()?;
    let state = app_state::AppState::new(cfg)?;
    let app = router::build_router(state);

    tracing::info!(%listen, "synapse-usage-exporter starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| UsageError::Internal(format!("bind {listen} failed: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| UsageError::Internal(format!("server failed: {e}")))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("signal received, starting graceful shutdown");
}
