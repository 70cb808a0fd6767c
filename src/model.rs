// Core structs: RawProduct, Product, ScraperOutcome, SearchRun
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Unprocessed candidate product as delivered by one store scraper.
/// Lives only for the duration of a single search run.
#[derive(Debug, Clone)]
pub struct RawProduct {
    pub store: String,
    pub name: String,
    pub price: f64,
    pub volume: String,
    pub image: String,
    pub link: String,
}

/// A raw product enriched with canonical volume and per-unit price fields.
///
/// `price_per_liter == 0.0` means the volume could not be determined; it is
/// never a real price. `unit_count` is always at least 1.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub store: String,
    pub name: String,
    pub price: f64,
    pub volume: String,
    pub image: String,
    pub link: String,
    pub logo: String,
    pub price_per_liter: f64,
    pub liter_value: f64,
    pub unit_count: u32,
    pub unit_size: f64,
    pub unit_type: String,
    pub price_per_unit: f64,
}

/// Per-scraper result of one search run.
#[derive(Debug, Clone, Serialize)]
pub struct ScraperOutcome {
    pub name: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub count: usize,
    pub elapsed_time: f64,
}

/// Everything one search run produced: ranked products plus per-scraper
/// outcomes in completion order.
#[derive(Debug)]
pub struct SearchRun {
    pub products: Vec<Product>,
    pub outcomes: Vec<ScraperOutcome>,
    pub total_elapsed: f64,
}

/// A product row as persisted, with its originating search term and
/// timestamps. Rows are written once and only removed by retention cleanup.
#[derive(Debug, Clone, Serialize)]
pub struct StoredProduct {
    pub id: i64,
    pub store: String,
    pub name: String,
    pub price: f64,
    pub volume: String,
    pub image: String,
    pub link: String,
    pub price_per_liter: f64,
    pub liter_value: f64,
    pub unit_count: u32,
    pub unit_size: f64,
    pub unit_type: String,
    pub price_per_unit: f64,
    pub search_term: String,
    pub scraped_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("invalid search url: {0}")]
    InvalidUrl(String),
    #[error("timed out after {0}s")]
    Timeout(u64),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}
