//! # dashviewd — dashview daemon
//!
//! Composition root that wires the hub, the subscription manager, and the
//! websocket adapter together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Initialize structured logging
//! - Construct the hub adapter and the application services
//! - Spawn the state-change dispatcher task
//! - Build the axum router and serve until shutdown
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

use std::sync::Arc;

use dashview_adapter_virtual::VirtualHub;
use dashview_adapter_ws_axum::router;
use dashview_adapter_ws_axum::state::AppState;
use dashview_app::subscriptions::SubscriptionManager;
use tracing_subscriber::EnvFilter;

mod config;

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    let hub = Arc::new(if config.hub.demo_home {
        VirtualHub::with_demo_home()
    } else {
        VirtualHub::new()
    });

    let manager = Arc::new(SubscriptionManager::new(
        Arc::clone(&hub),
        Arc::clone(&hub),
    ));

    // Fan state changes from the hub bus out to subscribed connections.
    let dispatcher = Arc::clone(&manager);
    let events = hub.events();
    tokio::spawn(async move { dispatcher.dispatch_from(events).await });

    let state = AppState::new(manager, hub);
    let app = router::build(state);

    let bind_addr = config.bind_addr();
    tracing::info!(addr = %bind_addr, "dashviewd listening");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown requested"),
        Err(err) => tracing::error!(error = %err, "failed to listen for shutdown signal"),
    }
}
