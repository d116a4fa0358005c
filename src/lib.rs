pub mod application;
pub mod domain;
pub mod http;
pub mod infrastructure;

use anyhow::Context;
use application::commands::AppState;
use std::path::PathBuf;
use std::sync::Arc;

const ROOT_ENV: &str = "HABITCANVAS_ROOT";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}

fn resolve_workspace_root() -> anyhow::Result<PathBuf> {
    match std::env::var(ROOT_ENV) {
        Ok(root) if !root.trim().is_empty() => Ok(PathBuf::from(root.trim())),
        _ => std::env::current_dir().context("failed to resolve current directory"),
    }
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

/// Bootstraps the workspace and serves the JSON API until ctrl-c.
pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    let workspace_root = resolve_workspace_root()?;
    let app_state = AppState::new(workspace_root).context("failed to initialize app state")?;
    let address = format!(
        "{}:{}",
        app_state.settings().listen_address,
        app_state.settings().port
    );
    tracing::info!(
        workspace = %app_state.workspace_root().display(),
        app = %app_state.settings().app_name,
        timezone = app_state.timezone().name(),
        "workspace ready"
    );

    let app = http::router(Arc::new(app_state));
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    tracing::info!("listening on http://{address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}
