use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

mod app;
mod health;
mod registry;
mod session;
mod ws;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sshrelay_gateway=info,tower_http=debug".into()),
        )
        .init();

    // load config: explicit path via SSHRELAY_CONFIG > ~/.sshrelay/sshrelay.toml
    let config_path = std::env::var("SSHRELAY_CONFIG").ok();
    let config = sshrelay_core::RelayConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        sshrelay_core::RelayConfig::default()
    });

    let bind = config.gateway.bind.clone();
    let port = config.gateway.port;

    let connector = Arc::new(sshrelay_shell::SshConnector::new());
    let state = Arc::new(app::AppState::new(config, connector));
    let router = app::build_router(state);

    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    info!("sshrelay gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
