use courier::config::CONFIG;
use courier::db::{DataDirResolver, DbDispatcher, DbEvent};
use mimalloc::MiMalloc;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = &*CONFIG;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        data_dir = %cfg.basic.data_dir.display(),
        database_file = %cfg.basic.database_file,
        schema_version = cfg.basic.schema_version,
        loglevel = %cfg.basic.loglevel,
        wal = cfg.store.wal,
        transactional_phases = cfg.store.transactional_phases,
    );

    let resolver = Arc::new(DataDirResolver::new(cfg.basic.data_dir.clone()));
    let db = DbDispatcher::spawn(cfg.store.clone(), resolver).await?;
    let mut events = db.subscribe();

    db.set_version(cfg.basic.schema_version)?;
    db.initialize(cfg.basic.database_file.clone())?;

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                DbEvent::Ready => info!("store ready"),
                DbEvent::Error { description, code } => {
                    error!(?code, "store error: {description}")
                }
                DbEvent::ReadAllFinished(id) => info!(handler = %id, "read all finished"),
            }
        }
    });

    shutdown_signal().await;
    info!("Shutting down, draining queued store operations.");
    if let Err(e) = db.close().await {
        warn!(error = %e, "store did not close cleanly");
    }
    info!("Store closed.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
