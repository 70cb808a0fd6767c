use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{error, info};

use crate::api::{ApiError, ApiState};
use crate::model::{Product, ScraperOutcome, StoredProduct};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub products: Vec<Product>,
    pub scraper_statuses: Vec<ScraperOutcome>,
    pub total_elapsed_time: f64,
    pub debug_mode: bool,
}

pub async fn search(
    State(state): State<ApiState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let term = params.q.trim();
    if term.chars().count() < 2 {
        return Err(ApiError::Validation(
            "Query parameter 'q' must be at least 2 characters".to_string(),
        ));
    }

    let run = state.orchestrator.run(term).await;

    // Best-effort persistence: a failed batch never fails the request.
    let saved = state.store.lock().await.save_batch(&run.products, term);
    info!(term, saved, "persisted search run");

    Ok(Json(SearchResponse {
        products: run.products,
        scraper_statuses: run.outcomes,
        total_elapsed_time: run.total_elapsed,
        debug_mode: state.debug_mode,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ProductParams {
    pub search_term: Option<String>,
    pub store: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub products: Vec<StoredProduct>,
    pub count: usize,
    pub limit: usize,
    pub offset: usize,
}

pub async fn products(
    State(state): State<ApiState>,
    Query(params): Query<ProductParams>,
) -> Result<Json<ProductsResponse>, ApiError> {
    let limit = params.limit.unwrap_or(100).clamp(1, 1000) as usize;
    let offset = params.offset.unwrap_or(0).max(0) as usize;

    let store = state.store.lock().await;
    let products = match (params.search_term.as_deref(), params.store.as_deref()) {
        (Some(term), _) if !term.is_empty() => store.by_search_term(term, limit, offset)?,
        (_, Some(name)) if !name.is_empty() => store.by_store(name, limit, offset)?,
        _ => store.all(limit, offset)?,
    };

    Ok(Json(ProductsResponse {
        count: products.len(),
        products,
        limit,
        offset,
    }))
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_products: i64,
    pub products_per_store: HashMap<String, i64>,
    pub unique_search_terms: i64,
    pub most_recent_scrape: Option<DateTime<Utc>>,
    pub database_path: String,
}

pub async fn database_stats(
    State(state): State<ApiState>,
) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state.store.lock().await.stats()?;
    Ok(Json(StatsResponse {
        total_products: stats.total_products,
        products_per_store: stats.products_per_store,
        unique_search_terms: stats.unique_search_terms,
        most_recent_scrape: stats.most_recent_scrape,
        database_path: stats.database_path,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CleanupParams {
    pub days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub message: String,
    pub deleted_count: usize,
}

pub async fn database_cleanup(
    State(state): State<ApiState>,
    Query(params): Query<CleanupParams>,
) -> Result<Json<CleanupResponse>, ApiError> {
    let days = params.days.unwrap_or(7).clamp(1, 365) as u32;

    let deleted_count = match state.store.lock().await.delete_older_than(days) {
        Ok(count) => count,
        Err(e) => {
            error!(error = %e, "cleanup failed");
            return Err(ApiError::Storage(e));
        }
    };

    Ok(Json(CleanupResponse {
        message: format!("Deleted {deleted_count} products older than {days} days"),
        deleted_count,
    }))
}
