//! Shared application state for axum handlers.

use std::sync::Arc;

use dashview_app::analyzer::HomeAnalyzer;
use dashview_app::entity_mapper::EntityMapper;
use dashview_app::ports::{AreaRegistry, DeviceRegistry, EntityRegistry, EntityWatcher};
use dashview_app::subscriptions::SubscriptionManager;

/// Application state shared across all websocket connections.
///
/// Generic over the hub type (one host provides all three registry views)
/// and the watcher to avoid dynamic dispatch. `Clone` is implemented
/// manually so the underlying types themselves do not need to be `Clone` —
/// only the `Arc` wrappers are cloned.
pub struct AppState<H, W> {
    /// Connection subscriptions and state-change fan-out.
    pub manager: Arc<SubscriptionManager<Arc<H>, W>>,
    /// Home complexity and area breakdowns.
    pub analyzer: Arc<HomeAnalyzer<Arc<H>, Arc<H>, Arc<H>>>,
    /// Entity relationship derivation.
    pub mapper: Arc<EntityMapper<Arc<H>, Arc<H>>>,
}

impl<H, W> Clone for AppState<H, W> {
    fn clone(&self) -> Self {
        Self {
            manager: Arc::clone(&self.manager),
            analyzer: Arc::clone(&self.analyzer),
            mapper: Arc::clone(&self.mapper),
        }
    }
}

impl<H, W> AppState<H, W>
where
    H: EntityRegistry + DeviceRegistry + AreaRegistry + Send + Sync + 'static,
    W: EntityWatcher + Send + Sync + 'static,
{
    /// Create the state from a pre-wrapped manager and the hub.
    ///
    /// The manager comes in as an `Arc` because the composition root also
    /// hands it to the background dispatcher task.
    pub fn new(manager: Arc<SubscriptionManager<Arc<H>, W>>, hub: Arc<H>) -> Self {
        Self {
            manager,
            analyzer: Arc::new(HomeAnalyzer::new(
                Arc::clone(&hub),
                Arc::clone(&hub),
                Arc::clone(&hub),
            )),
            mapper: Arc::new(EntityMapper::new(Arc::clone(&hub), hub)),
        }
    }
}
