pub mod error;
pub mod handlers;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{
    Router,
    routing::{get, post},
};

pub fn build_api_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/generate-pdf", post(handlers::generate_pdf))
        .route("/api/generate-screenshot", post(handlers::generate_screenshot))
        .route("/api/render", post(handlers::render_markdown))
        .route("/_health", get(handlers::health))
        .with_state(state)
}
