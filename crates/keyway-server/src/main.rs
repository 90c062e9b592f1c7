//! Keyway console server entry point.
//!
//! Loads configuration once, assembles the gateway policy and its security
//! headers, then serves the console with graceful shutdown.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use keyway_server::config::ServerConfig;
use keyway_server::gateway::GatewayPolicy;
use keyway_server::headers::SecurityHeaders;
use keyway_server::routes::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env().context("invalid configuration")?;

    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    let integrations = &config.console.integrations;
    info!(
        api = config.console.api_base_url(),
        static_dir = %config.static_dir.display(),
        posthog = integrations.posthog.is_some(),
        sentry = integrations.sentry_dsn.is_some(),
        crisp = integrations.crisp_website_id.is_some(),
        "Keyway console starting"
    );

    let headers = SecurityHeaders::from_config(&config.console)
        .context("integration settings produce an invalid security header")?;
    let policy = Arc::new(GatewayPolicy::new(&config.gateway, headers));

    if !config.static_dir.join("index.html").is_file() {
        tracing::warn!(
            static_dir = %config.static_dir.display(),
            "index.html not found, console routes will return 404"
        );
    }

    let app = build_router(policy, &config.static_dir);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Keyway console stopped");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, stopping server");
}
