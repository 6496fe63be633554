//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use dashview_app::ports::{AreaRegistry, DeviceRegistry, EntityRegistry, EntityWatcher};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// `/ws` upgrades to the websocket command surface; `/health` answers
/// plain `OK` for liveness probes. Includes a [`TraceLayer`] that logs
/// each request/response at the `DEBUG` level using the `tracing`
/// ecosystem.
pub fn build<H, W>(state: AppState<H, W>) -> Router
where
    H: EntityRegistry + DeviceRegistry + AreaRegistry + Send + Sync + 'static,
    W: EntityWatcher + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(crate::connection::ws_handler::<H, W>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
