use axum::{routing::get, Router};
use sshrelay_core::config::RelayConfig;
use sshrelay_shell::RemoteConnector;
use std::sync::Arc;

use crate::registry::SessionRegistry;

/// Central shared state — passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: RelayConfig,
    pub registry: SessionRegistry,
    pub connector: Arc<dyn RemoteConnector>,
}

impl AppState {
    pub fn new(config: RelayConfig, connector: Arc<dyn RemoteConnector>) -> Self {
        Self {
            config,
            registry: SessionRegistry::new(),
            connector,
        }
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::health::health_handler))
        .route("/ssh-stream", get(crate::ws::ws_handler))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
