//! Server setup and lifecycle management

use crate::config::ServiceConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::routes::create_router;
use crate::state::AppState;
use tokio::net::TcpListener;

/// Faultline HTTP server
pub struct Server {
    config: ServiceConfig,
    state: AppState,
}

impl Server {
    /// Create a new server with the given configuration
    pub fn new(config: ServiceConfig) -> Self {
        let state = AppState::new(&config);
        Self { config, state }
    }

    /// Run the server
    pub async fn run(self) -> ServiceResult<()> {
        let addr = self.config.server.listen_addr;

        let app = create_router(self.state, self.config.server.enable_cors);

        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Faultline listening on {}", addr);
        tracing::info!(
            design = ?self.config.engine.design,
            mode = ?self.config.engine.mode,
            random_order = self.config.engine.random_order,
            draw_mode = ?self.config.trigger.draw_mode,
            "Anomaly engine configured"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServiceError::Server(e.to_string()))?;

        tracing::info!("Faultline shutting down");
        Ok(())
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
