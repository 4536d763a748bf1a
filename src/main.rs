use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use clap::Parser;
use tracing::{error, info};

mod api;
mod cli;
mod config;
mod db;
mod reconciler;
mod shutdown;
mod telemetry;
mod worker;

use crate::api::AppState;
use crate::cli::{Cli, Command};
use crate::db::store::DocumentStore;
use crate::reconciler::JobReconciler;
use crate::shutdown::ShutdownCoordinator;
use crate::worker::ReconcileWorker;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    // Load configuration from environment
    let config = config::Config::from_env().expect("Failed to load configuration");

    telemetry::init_tracing(&config.log_dir)?;

    info!("Starting job-archiver ({:?})", cli.command());
    info!("Configuration loaded successfully:");
    info!("  - Store backend: {:?}", config.store_backend);
    info!("  - Max payload size: {} bytes", config.max_payload_size);
    info!("  - Max database connections: {}", config.max_db_connections);
    info!("  - Reconcile interval: {:?}", config.reconciler.interval);
    info!("  - Expiry action: {:?}", config.reconciler.expiry_action);

    // Migrations run as part of opening a postgres store
    let store = db::open_store(&config)
        .await
        .expect("Failed to open document store");

    let reconciler = Arc::new(JobReconciler::new(store.clone(), config.reconciler.clone()));

    match cli.command() {
        Command::Migrate => {
            match config.store_backend {
                config::StoreBackend::Postgres => {
                    info!("Database migrations completed successfully")
                }
                config::StoreBackend::Memory => info!("In-memory store has no migrations to run"),
            }
            store.close().await;
            Ok(())
        }
        Command::Reconcile => {
            let result = reconciler.reconcile().await;
            store.close().await;
            match result {
                Ok(report) => {
                    info!(
                        "Sweep finished: {} scanned, {} archived, {} protected, {} already archived, {} stale removed, {} failed",
                        report.scanned,
                        report.archived,
                        report.protected,
                        report.already_archived,
                        report.stale_removed,
                        report.failed
                    );
                    Ok(())
                }
                Err(e) => {
                    error!("Sweep failed after archiving {} jobs: {}", e.archived(), e);
                    Err(std::io::Error::other(e))
                }
            }
        }
        Command::DedupeHistory => {
            let result = reconciler::maintenance::remove_duplicate_history(&store).await;
            store.close().await;
            match result {
                Ok(removed) => {
                    info!("Removed {} duplicate history records", removed);
                    Ok(())
                }
                Err(e) => {
                    error!("Failed to remove duplicate history records: {}", e);
                    Err(std::io::Error::other(e))
                }
            }
        }
        Command::Serve => serve(config, store, reconciler).await,
    }
}

async fn serve(
    config: config::Config,
    store: Arc<dyn DocumentStore>,
    reconciler: Arc<JobReconciler>,
) -> std::io::Result<()> {
    // watch channel allows multiple receivers to get the same value
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let worker = ReconcileWorker::new(reconciler.clone());
    let worker_handle = tokio::spawn(async move {
        worker.run(shutdown_rx).await;
    });
    info!("Spawned reconcile worker");

    let state = AppState::new(store.clone(), reconciler);
    let max_payload_size = config.max_payload_size;

    let server = HttpServer::new(move || {
        // Configure payload size limits globally
        let payload_config = web::PayloadConfig::default().limit(max_payload_size);
        let state = state.clone();

        App::new()
            .app_data(payload_config)
            .configure(|cfg| state.configure(cfg))
    });

    info!("Server starting on http://{}:{}", config.host, config.port);

    let server = server.bind((config.host.as_str(), config.port))?.run();
    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    let coordinator =
        ShutdownCoordinator::new(server_handle, server_task, worker_handle, shutdown_tx, store);

    coordinator.wait_for_shutdown().await
}
