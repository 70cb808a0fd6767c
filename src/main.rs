use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use prijsjager::api;
use prijsjager::config::Config;
use prijsjager::orchestrator::Orchestrator;
use prijsjager::scraper::sites;
use prijsjager::storage::ProductStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let config = Config::from_env();

    let default_filter = if config.debug_mode {
        "prijsjager=debug"
    } else {
        "prijsjager=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    // An unreachable database is the only process-fatal condition.
    let store = ProductStore::open(&config.db_path)
        .with_context(|| format!("failed to open database at {}", config.db_path))?;
    info!(path = %config.db_path, "database initialized");

    let client = reqwest::Client::builder()
        .user_agent("Mozilla/5.0 (X11; Linux x86_64) Prijsjager/0.1")
        .build()
        .context("failed to build http client")?;

    let orchestrator = Orchestrator::new(
        sites::default_scrapers(&client),
        config.max_concurrent_scrapers,
        Duration::from_secs(config.scraper_timeout_secs),
    );

    let state = api::ApiState {
        orchestrator: Arc::new(orchestrator),
        store: Arc::new(Mutex::new(store)),
        debug_mode: config.debug_mode,
    };
    let app = api::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    info!(%addr, debug_mode = config.debug_mode, "server starting");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
