//! # servicedbd
//!
//! Composition root that wires the `SQLite` engine, the notification bus and
//! the service actor together and runs it until interrupted.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialise logging
//! - Construct the store engine and the in-process notification bus
//! - Spawn the service actor and drive its Init / Close / Deinit transitions
//! - Log every notification broadcast by the service
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;

use anyhow::Context;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tracing_subscriber::EnvFilter;

use servicedb_adapter_storage_sqlite_sqlx::SqliteEngine;
use servicedb_app::event_bus::InProcessNotificationBus;
use servicedb_app::service::{CloseReason, ServiceDb};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    let bus = InProcessNotificationBus::new(config.notifications.capacity);
    let mut notifications = BroadcastStream::new(bus.subscribe());
    tokio::spawn(async move {
        while let Some(event) = notifications.next().await {
            match event {
                Ok(event) => {
                    tracing::info!(domain = %event.domain, kind = %event.kind, "notification");
                }
                Err(err) => tracing::warn!(error = %err, "notification subscriber lagged"),
            }
        }
    });

    let engine = SqliteEngine::new(config.engine());
    let (service, task) = ServiceDb::spawn(engine, bus, config.service());
    service.init().await.context("starting servicedb")?;
    tracing::info!(
        user_dir = %config.storage.user_dir.display(),
        "servicedb running"
    );

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;

    service.close(CloseReason::RegularPowerDown).await?;
    service.deinit().await?;
    task.await.context("joining service task")?;
    tracing::info!("servicedb stopped");
    Ok(())
}
