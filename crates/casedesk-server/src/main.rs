//! casedesk server entry point.

use anyhow::Context;
use casedesk_db::DbManager;
use casedesk_db::repository::{SurrealAppealStatusRepository, SurrealUserRepository};
use casedesk_server::bootstrap::{ensure_initial_status, ensure_superuser};
use casedesk_server::config::ServerConfig;
use casedesk_server::state::{AppState, delivery_router};
use casedesk_workflow::ChannelNotificationSink;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env().context("failed to load configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).json().init();

    tracing::info!("Starting casedesk server...");

    let manager = DbManager::connect(&config.db)
        .await
        .context("failed to connect to SurrealDB")?;
    let db = manager.client().clone();
    casedesk_db::run_migrations(&db)
        .await
        .context("failed to run migrations")?;

    ensure_initial_status(
        &SurrealAppealStatusRepository::new(db.clone()),
        &config.workflow.initial_status_name,
    )
    .await?;

    if let Some(admin) = &config.first_superuser {
        let users = match &config.password_pepper {
            Some(pepper) => SurrealUserRepository::with_pepper(db.clone(), pepper.clone()),
            None => SurrealUserRepository::new(db.clone()),
        };
        ensure_superuser(&users, admin, config.password_pepper.as_deref()).await?;
    }

    let (sink, rx) = ChannelNotificationSink::channel(config.notification_buffer);
    let delivery = tokio::spawn(delivery_router(db.clone()).run(rx));

    let state = AppState::new(db, sink, config.workflow.clone());
    tracing::info!("casedesk server ready");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    tracing::info!("Shutting down...");

    // Dropping the services closes the intent channel; let delivery drain.
    drop(state);
    delivery.await.context("delivery task panicked")?;

    tracing::info!("casedesk server stopped.");
    Ok(())
}
