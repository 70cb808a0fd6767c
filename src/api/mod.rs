// HTTP boundary: request validation and response shaping only.

pub mod handlers;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

use crate::model::StorageError;
use crate::orchestrator::Orchestrator;
use crate::storage::ProductStore;

#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<Orchestrator>,
    pub store: Arc<Mutex<ProductStore>>,
    pub debug_mode: bool,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/search", get(handlers::search))
        .route("/products", get(handlers::products))
        .route("/database/stats", get(handlers::database_stats))
        .route("/database/cleanup", get(handlers::database_cleanup))
        .with_state(state)
        // Permissive CORS also answers OPTIONS preflight with 200.
        .layer(CorsLayer::permissive())
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
