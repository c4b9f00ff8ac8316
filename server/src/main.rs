//! Quotation Server Binary
//!
//! Wires the store, the rate source, the quotation manager and the HTTP API
//! together from environment configuration.

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use quotation_fx::{FrankfurterRateSource, RandomRateSource, SharedRateSource};
use quotation_server::api::{create_metrics_router, create_router, AppState};
use quotation_server::config::{AppEnv, RateSourceKind, StoreBackend};
use quotation_server::{QuotationManager, QuotationService, ServerConfig};
use quotation_store::{InMemoryQuotationStore, PostgresQuotationStore, SharedStore};

fn init_tracing(env: AppEnv) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(env.default_log_filter()));

    let registry = tracing_subscriber::registry().with(filter);
    if env.json_logs() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn build_store(config: &ServerConfig) -> anyhow::Result<SharedStore> {
    match config.store_backend {
        StoreBackend::Postgres => {
            let store = PostgresQuotationStore::connect(&config.postgres_config())
                .await
                .context("Failed to connect to database")?;
            store
                .migrate()
                .await
                .context("Failed to prepare database schema")?;
            info!("Connected to PostgreSQL");
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory store, requests are lost on restart");
            Ok(Arc::new(InMemoryQuotationStore::new()))
        }
    }
}

fn build_rate_source(config: &ServerConfig) -> anyhow::Result<SharedRateSource> {
    match config.rate_source {
        RateSourceKind::Frankfurter => {
            let source = FrankfurterRateSource::new(config.frankfurter_config())
                .context("Failed to build Frankfurter client")?;
            Ok(Arc::new(source))
        }
        RateSourceKind::Random => {
            warn!("Using random rate source");
            Ok(Arc::new(RandomRateSource::new()))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
        return;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env()
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    init_tracing(config.env);

    info!(env = %config.env, "Starting quotation service");

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let store = build_store(&config).await.map_err(|e| {
        error!(error = %e, "Store initialization failed");
        e
    })?;
    let rate_source = build_rate_source(&config)?;

    let manager = Arc::new(QuotationManager::new(
        config.manager_config(),
        store.clone(),
        rate_source,
    ));
    manager.start()?;

    let service = Arc::new(QuotationService::new(store, manager.clone()));
    let router = create_router(
        Arc::new(AppState::new(service)),
        config.incoming_request_timeout,
    );

    let metrics_listener = tokio::net::TcpListener::bind(config.metrics_socket())
        .await
        .with_context(|| format!("Failed to bind {}", config.metrics_socket()))?;
    let metrics_router = create_metrics_router(manager.clone());
    let metrics_server = tokio::spawn(async move {
        axum::serve(metrics_listener, metrics_router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    });

    let listener = tokio::net::TcpListener::bind(config.listen_socket())
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_socket()))?;

    info!(
        listen_addr = %config.listen_addr,
        listen_port = %config.listen_port,
        metrics_port = %config.metrics_port,
        "Quotation service running"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    match metrics_server.await {
        Ok(Err(e)) => error!(error = %e, "Metrics server failed"),
        Err(e) => error!(error = %e, "Metrics server task failed"),
        Ok(Ok(())) => {}
    }

    manager.stop().await?;

    info!("Quotation service shutdown complete");
    Ok(())
}
