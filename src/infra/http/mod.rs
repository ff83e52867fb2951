pub mod api;
mod middleware;

pub use api::{ApiState, build_api_router};
pub use middleware::RequestContext;

use std::net::SocketAddr;

use axum::{Router, extract::DefaultBodyLimit, middleware as axum_middleware};
use tokio::net::TcpListener;
use tracing::info;

use crate::infra::error::InfraError;

use middleware::{log_responses, set_request_context};

/// Full application router with logging, request ids and the body size cap.
pub fn build_router(state: ApiState, body_limit_bytes: usize) -> Router {
    build_api_router(state)
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

/// Bind and serve until ctrl-c.
pub async fn serve(router: Router, addr: SocketAddr) -> Result<(), InfraError> {
    let listener = TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    info!(target = "markprint::http", address = %local, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!(target = "markprint::http", "shutdown requested");
    }
}
