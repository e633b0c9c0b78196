use std::{net::SocketAddr, process::ExitCode};

use axum::Router;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::{app::App, config::Config, environment::Environment, router::router};

pub async fn handle_serve_command(environment: Environment, config: Config) -> ExitCode {
    let port = config.server.port;

    let app = match App::new(environment, config) {
        Ok(app) => app,
        Err(e) => {
            error!("❌ Failed to build HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match start_server(router(app), port).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("❌ Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn start_server(router: Router, port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    info!("🌐 Server starting on http://{}", addr);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("🛑 Shutting down");
}
