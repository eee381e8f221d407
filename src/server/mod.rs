//! HTTP server
//!
//! Axum wiring around the authorizer.

pub mod middleware;
pub mod routes;

pub use middleware::{AuthzState, ErrorBody, Rejection, authz_middleware};
pub use routes::build_router;

use crate::config::ServerConfig;
use crate::util::bind_addr;
use tokio::net::TcpListener;
use tracing::info;

/// Bind and serve until Ctrl+C
pub async fn run_server(config: &ServerConfig, state: AuthzState) -> anyhow::Result<()> {
    let addr = bind_addr(&config.host, config.port)?;
    let app = build_router(state);

    let listener = TcpListener::bind(addr).await?;
    info!("rbac-gate listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
