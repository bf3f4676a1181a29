//! Address change indexer entry point.

use std::process::ExitCode;

use event_store::{EventStoreError, PostgresEventStore};
use fact_store::{FactStoreError, PostgresFactSink};
use indexer::{Config, IndexerPipeline, LogFormat, PipelineSettings, Shutdown};
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const MAX_CONNECTIONS: u32 = 5;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(log_level: &str, format: LogFormat) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

async fn connect(config: &Config) -> indexer::Result<(PostgresEventStore, PostgresFactSink)> {
    let event_pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(&config.event_store_url)
        .await
        .map_err(EventStoreError::from)?;
    let store = PostgresEventStore::new(event_pool);
    store
        .run_migrations()
        .await
        .map_err(EventStoreError::from)?;

    let fact_pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(&config.fact_store_url)
        .await
        .map_err(FactStoreError::from)?;
    let sink =
        PostgresFactSink::with_table(fact_pool, &config.fact_store_schema, &config.fact_store_table)?;

    Ok((store, sink))
}

async fn run(config: Config, shutdown: Shutdown) -> indexer::Result<()> {
    if let Some(addr) = config.metrics_addr {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;
        tracing::info!(%addr, "serving Prometheus metrics");
    }

    let (store, sink) = tokio::select! {
        biased;
        () = shutdown.triggered() => return Ok(()),
        connected = connect(&config) => connected?,
    };
    tracing::info!(table = sink.table_name(), "writing facts");

    IndexerPipeline::new(store, sink, PipelineSettings::from(&config))
        .with_shutdown(shutdown)
        .run()
        .await
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            init_tracing("info", LogFormat::Text);
            tracing::error!(error = %err, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.log_level, config.log_format);

    let shutdown = Shutdown::new();
    let signalled = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signalled.trigger();
    });

    match run(config, shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "indexer failed");
            ExitCode::FAILURE
        }
    }
}
