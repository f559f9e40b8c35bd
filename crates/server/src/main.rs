//! The binary entrypoint: loads settings, initializes tracing, connects
//! Postgres, wires `store`/`index`/`bus`/`ingest`/`api` together, and runs
//! the HTTP server and the bus consumer concurrently under one
//! graceful-shutdown signal. Grounded on `control::main`/`control::startup`/
//! `control::cmd::serve`, collapsed into a single binary since this service
//! has no subcommand surface of its own.

mod shutdown;

use anyhow::Context;
use bus::{AmqpListener, ListenerConfig, MessageHandler, MessageListener};
use index::{HttpIndexBridge, IndexBridge};
use ingest::Ingestor;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use store::{CurrentDocumentScan, CurrentStore, HistoryDocumentScan, HistoryStore, PgCurrentStore, PgHistoryStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let settings = config_loader::settings();

    let db = PgPoolOptions::new()
        .min_connections(1)
        .connect(&settings.database.url())
        .await
        .context("failed to connect to postgres")?;

    let history = Arc::new(PgHistoryStore::new(db.clone()));
    let current = Arc::new(PgCurrentStore::new(db.clone()));

    let index_base_url = settings.index.base_url.parse::<url::Url>().context("invalid index.base_url")?;
    let index = Arc::new(HttpIndexBridge::new(reqwest::Client::new(), index_base_url, settings.index.name.clone()));

    let history_store: Arc<dyn HistoryStore> = history.clone();
    let current_store: Arc<dyn CurrentStore> = current.clone();
    let history_scan: Arc<dyn HistoryDocumentScan> = history.clone();
    let current_scan: Arc<dyn CurrentDocumentScan> = current.clone();
    let index_bridge: Arc<dyn IndexBridge> = index.clone();

    let ingestor = Ingestor::new(history_store.clone(), current_store.clone(), index_bridge.clone());

    let ctx = api::AppContext::new(
        db,
        history_store,
        current_store,
        history_scan,
        current_scan,
        index_bridge,
        settings.schema.clone(),
        settings.index.reindex_chunk,
    );

    let app = api::router(ctx);
    let http_addr = format!("{}:{}", settings.api.host, settings.api.port);
    let listener = tokio::net::TcpListener::bind(&http_addr).await.context("failed to bind HTTP listener")?;
    tracing::info!(address = %http_addr, "listening");
    let http_server = axum::serve(listener, app).with_graceful_shutdown(shutdown::signal());

    let amqp = lapin::Connection::connect(&settings.bus.amqp_url, lapin::ConnectionProperties::default())
        .await
        .context("failed to connect to amqp broker")?;
    let channel = amqp.create_channel().await.context("failed to open amqp channel")?;
    let amqp_listener = AmqpListener::new(channel, listener_config(settings));
    let handler: Arc<dyn MessageHandler> = Arc::new(ingestor);

    let (http_result, bus_result) = tokio::join!(
        async { http_server.await.context("http server failed") },
        async { amqp_listener.run(handler, Box::pin(shutdown::signal())).await.context("bus listener failed") },
    );

    http_result?;
    bus_result?;
    Ok(())
}

fn listener_config(settings: &config_loader::Settings) -> ListenerConfig {
    ListenerConfig {
        input_queue: settings.listener.input.queue.clone(),
        input_exchange: settings.listener.input.exchange.clone(),
        input_exchange_type: settings.listener.input.exchange_type.clone(),
        binding_arguments: settings.listener.input.binding_arguments.clone(),
        prefetch: settings.listener.input.prefetch,
        error_exchange: settings.listener.error.exchange.clone(),
        error_message_timeout: Duration::from_millis(settings.listener.error.message_timeout_ms),
        distributor_output_exchange: settings.listener.distributor.output.exchange.clone(),
        retry_interval: Duration::from_millis(settings.listener.retry_interval_ms),
        actor_timeout: Duration::from_millis(settings.listener.actor_timeout_ms),
        initial_retry_interval: Duration::from_millis(settings.bus.initial_retry_interval_ms),
        max_retry_interval: Duration::from_millis(settings.bus.max_retry_interval_ms),
    }
}
