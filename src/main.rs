use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use collection_gateway::{
    app::app,
    cli::Cli,
    config::AppConfig,
    database::{DatabaseManager, DocumentStore, MemoryStore, Repository},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, BASIC_AUTH_USER, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env();
    cli.apply(&mut config);
    config.validate(cli.memory)?;

    tracing::info!("Starting collection gateway in {:?} mode", config.environment);

    let store = connect_store(&config, cli.memory).await?;
    let state = AppState::new(&config, store)?;
    for collection in state.collections.iter() {
        tracing::info!("Serving collection '{}' at {}", collection.name, collection.base_path());
    }

    let app = app(state, &config.security.cors_origins);

    let bind_addr = format!("{}:{}", config.api.host, config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Connect once at startup; the handle is shared by every request
async fn connect_store(config: &AppConfig, memory: bool) -> anyhow::Result<Arc<dyn DocumentStore>> {
    if memory {
        tracing::warn!("Using the in-memory store; documents are lost on exit");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let url = config.store.url.as_deref().context("DATABASE_URL is not set")?;
    match DatabaseManager::connect(url, &config.store).await {
        Ok(pool) => Ok(Arc::new(Repository::new(pool))),
        Err(e) if config.store.required => {
            tracing::error!("Document store connection failed: {}", e);
            Err(e).context("document store connection failed")
        }
        Err(e) => {
            tracing::error!("Document store connection failed: {}", e);
            tracing::warn!("STORE_REQUIRED=false; continuing with the in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
