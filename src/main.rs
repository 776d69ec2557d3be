use std::sync::Arc;

use tracing::info;

use riskd::config::Config;
use riskd::http::ApiServer;
use riskd::scoring::ScoringEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "riskd=info".into()),
        )
        .init();

    info!("📦 riskd v{} starting...", env!("CARGO_PKG_VERSION"));

    // Load config
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "riskd.toml".to_string());

    let config = Config::load(&config_path)?;
    let config = Arc::new(config);

    // Initialize scoring engine (loads model artifacts, journal, counters)
    let engine = Arc::new(ScoringEngine::new(config.clone()));

    // Start model hot-reload loop
    let reload_registry = engine.registry.clone();
    tokio::spawn(async move {
        reload_registry.run_reload_loop().await;
    });

    // Serve the HTTP API on the main task
    let server = ApiServer::new(engine, config);
    server.run().await
}
