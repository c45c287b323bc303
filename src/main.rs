//! gamebot binary entrypoint wiring configuration, storage and the VK long-poll loop.

use std::sync::Arc;

use anyhow::{Context, bail};
use tracing::{error, info, warn};

use gamebot::{
    config::{AppConfig, StoreKind},
    dao::{
        gateway::PersistenceGateway,
        result_store::{ResultStore, memory::MemoryResultStore},
    },
    logging::init_tracing,
    state::AppState,
    transport::{
        Messenger,
        vk::{LongPoll, VkClient},
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    if let Err(err) = run().await {
        error!(error = %format!("{err:#}"), "startup failed");
        return Err(err);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let config = AppConfig::load();

    let Some(token) = config.vk_token.as_deref() else {
        bail!("VK_TOKEN is not set");
    };
    let client = VkClient::new(&config.vk_api_url, token, &config.vk_api_version)
        .context("building VK client")?;
    let group = client
        .own_group()
        .await
        .context("resolving the token's community")?;
    info!(group_id = group.id, name = %group.name, "authorised as community");

    let store = open_store(&config).await?;
    let state = AppState::new(PersistenceGateway::new(store, config.store_timeout));

    let long_poll = LongPoll::connect(client.clone(), group.id, config.long_poll_wait)
        .await
        .context("obtaining long-poll server")?;
    let messenger: Arc<dyn Messenger> = Arc::new(client);

    info!("VK long-poll bot started");
    tokio::select! {
        _ = long_poll.run(state, messenger) => {},
        _ = shutdown_signal() => info!("shutdown signal received"),
    }
    Ok(())
}

async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn ResultStore>> {
    match config.store {
        StoreKind::Memory => {
            warn!("using the in-memory result store; results are lost on restart");
            Ok(Arc::new(MemoryResultStore::new()))
        }
        StoreKind::Postgres => open_postgres(config).await,
    }
}

#[cfg(feature = "postgres-store")]
async fn open_postgres(config: &AppConfig) -> anyhow::Result<Arc<dyn ResultStore>> {
    use gamebot::dao::result_store::postgres::{PostgresConfig, PostgresResultStore};

    let postgres = PostgresConfig::new(config.database_url.as_str())
        .with_acquire_timeout(config.store_timeout);
    let store = PostgresResultStore::connect(postgres)
        .await
        .context("connecting to PostgreSQL")?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "postgres-store"))]
async fn open_postgres(_config: &AppConfig) -> anyhow::Result<Arc<dyn ResultStore>> {
    bail!("built without PostgreSQL support; set GAMEBOT_STORE=memory")
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "cannot install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
