use axum::{routing::get, Router};

pub mod system;
pub mod transcripts;

/// Router for every endpoint.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/stats", get(system::stats))
        .merge(transcripts::router())
}
