pub mod error;
pub mod pages;
pub mod routes;
pub mod state;

use axum::{extract::DefaultBodyLimit, routing::{get, post}, Router};
use crate::adapters::http::state::HttpState;

pub fn router(state: HttpState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(pages::home).post(pages::home_upload))
        .route("/about", get(pages::about))
        .route("/information", get(pages::information))
        .route("/api/detect", post(routes::detect))
        .route("/api/classes", get(routes::list_classes))
        .route("/api/config", get(routes::get_config))
        .route("/health", get(routes::health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}
