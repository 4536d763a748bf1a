use std::sync::Arc;

use actix_web::dev::ServerHandle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::db::store::DocumentStore;

/// Handles graceful shutdown of the application
///
/// On SIGTERM or CTRL+C:
/// 1. Stop the HTTP server (no new requests, in-flight ones finish)
/// 2. Signal the reconcile worker; a sweep in progress runs to completion
/// 3. Close the document store
pub struct ShutdownCoordinator {
    server_handle: ServerHandle,
    server_task: JoinHandle<Result<(), std::io::Error>>,
    worker_handle: JoinHandle<()>,
    shutdown_tx: watch::Sender<bool>,
    store: Arc<dyn DocumentStore>,
}

impl ShutdownCoordinator {
    pub fn new(
        server_handle: ServerHandle,
        server_task: JoinHandle<Result<(), std::io::Error>>,
        worker_handle: JoinHandle<()>,
        shutdown_tx: watch::Sender<bool>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            server_handle,
            server_task,
            worker_handle,
            shutdown_tx,
            store,
        }
    }

    /// Block until a shutdown signal arrives, then shut down in order
    pub async fn wait_for_shutdown(self) -> Result<(), std::io::Error> {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        #[cfg(unix)]
        let terminate = sigterm.recv();

        #[cfg(not(unix))]
        let terminate = std::future::pending::<Option<()>>();

        tokio::select! {
            result = ctrl_c => {
                result?;
                info!("Received CTRL+C signal, initiating graceful shutdown...");
            }
            _ = terminate => {
                info!("Received SIGTERM signal, initiating graceful shutdown...");
            }
        }

        self.shutdown().await
    }

    async fn shutdown(self) -> Result<(), std::io::Error> {
        info!("Stopping HTTP server (no longer accepting new requests)...");
        self.server_handle.stop(true).await;

        info!("Signaling reconcile worker to stop...");
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal to worker: {:?}", e);
        }
        match self.worker_handle.await {
            Ok(()) => info!("Reconcile worker stopped"),
            Err(e) => error!("Reconcile worker failed to stop: {:?}", e),
        }

        match self.server_task.await {
            Ok(Ok(())) => info!("HTTP server shut down successfully"),
            Ok(Err(e)) => error!("HTTP server encountered error during shutdown: {:?}", e),
            Err(e) => error!("HTTP server task panicked: {:?}", e),
        }

        info!("Closing document store...");
        self.store.close().await;

        info!("Graceful shutdown completed successfully");
        Ok(())
    }
}
