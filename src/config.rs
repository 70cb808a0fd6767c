use std::env;

/// Process-wide settings, read once at startup and passed down explicitly.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub db_path: String,
    pub debug_mode: bool,
    pub max_concurrent_scrapers: usize,
    pub scraper_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env_parsed("PORT", 8100),
            db_path: env::var("DB_PATH").unwrap_or_else(|_| "products.db".to_string()),
            debug_mode: env::var("DEBUG_MODE").map(|v| v == "true").unwrap_or(false),
            max_concurrent_scrapers: env_parsed("MAX_CONCURRENT_SCRAPERS", 5),
            scraper_timeout_secs: env_parsed("SCRAPER_TIMEOUT_SECS", 45),
        }
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
