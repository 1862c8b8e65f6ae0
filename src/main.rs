use bumpline::{routes::create_router, worker::BumpWorker, AppState, Config};
use migration::{Migrator, MigratorTrait};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,bumpline=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting bumpline");

    let config = Config::load()?;

    tracing::info!(
        "Loaded configuration - Server: {}:{}, worker enabled: {}",
        config.server.host,
        config.server.port,
        config.worker.enabled
    );

    let state = AppState::new(config.clone()).await?;

    if config.database.run_migrations {
        Migrator::up(&state.db, None).await?;
        tracing::info!("Applied pending migrations");
    }

    let shutdown = CancellationToken::new();

    let worker_handle = if config.worker.enabled {
        let worker = BumpWorker::new(state.schedule_service.clone(), &config.worker);
        Some(tokio::spawn(worker.run(shutdown.child_token())))
    } else {
        None
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    let server_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
        tracing::info!("Shutdown requested");
        server_shutdown.cancel();
    });

    let server_token = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { server_token.cancelled().await })
        .await?;

    shutdown.cancel();
    if let Some(handle) = worker_handle {
        handle.await?;
    }

    tracing::info!("bumpline stopped");

    Ok(())
}
