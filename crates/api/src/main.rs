use std::sync::Arc;

use anyhow::Context;

use cardhub_api::app::{AppServices, build_app};
use cardhub_core::SystemClock;
use cardhub_infra::config::AppConfig;
use cardhub_infra::store::{InMemoryDirectory, PostgresDirectory};
use cardhub_observability::LogFormat;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cardhub_observability::init(LogFormat::from_env());

    let config = AppConfig::from_env().context("loading configuration")?;
    tracing::info!(?config, "configuration loaded");

    let clock = Arc::new(SystemClock);
    let services = match &config.database_url {
        Some(url) => {
            let directory = PostgresDirectory::connect(url, config.database_max_connections)
                .await
                .context("connecting to postgres")?;
            directory.migrate().await.context("applying schema")?;
            AppServices::from_config(&config, Arc::new(directory), clock)?
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using an empty in-memory directory");
            AppServices::from_config(&config, Arc::new(InMemoryDirectory::new()), clock)?
        }
    };

    let app = build_app(Arc::new(services), config.request_timeout);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
