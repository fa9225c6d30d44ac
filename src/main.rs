//! DeepSeek Chat Proxy Server
//!
//! HTTP gateway that validates chat requests, forwards them to DeepSeek and
//! records usage history

use anyhow::{Context, Result};
use deepseek_proxy::{config::Settings, create_router, store};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load settings from environment (.env supported)
    let settings = Settings::new().context("Failed to load server settings")?;

    // Initialize logging
    init_logging(&settings.logging.level, &settings.logging.format)?;
    info!("{}", deepseek_proxy::version_info());

    let store = store::from_settings(&settings.history).context("Failed to open history store")?;

    let addr = format!("{}:{}", settings.server.host, settings.server.port);

    // Create router
    let app = create_router(settings, store).await?;

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("🚀 DeepSeek proxy server started!");
    info!("📝 Health check: http://{}/api/health", addr);
    info!("💬 Chat endpoint: http://{}/api/chat", addr);
    info!("🔎 GraphQL endpoint: http://{}/api/graphql", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start server: {}", e))?;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging system
fn init_logging(log_level: &str, log_format: &str) -> Result<()> {
    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = if log_format == "json" {
        // JSON format logs (production environment)
        Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(log_level)
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .finish(),
        )
    } else {
        // Human readable format (development environment)
        Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(log_level)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .finish(),
        )
    };

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Logging system initialized");
    Ok(())
}

/// Resolve on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
