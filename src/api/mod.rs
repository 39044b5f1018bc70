pub mod connection;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod state;

use crate::api::state::SharedState;
use std::sync::Arc;

pub async fn start_server(state: SharedState) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{}", state.config.server.port);
    let app = routes::app_router(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await?;
    Ok(())
}

async fn shutdown_signal(state: SharedState) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutting down");
    state.cancel_all_evictions();
}
