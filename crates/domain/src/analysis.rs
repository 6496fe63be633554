//! Derived analysis records: per-area breakdowns, the home report, and
//! subscription statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::category::EntityCategory;
use crate::id::{AreaKey, EntityKey};

/// Per-area breakdown used by the dashboard layout engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaInfo {
    pub area_id: AreaKey,
    pub name: String,
    /// Sorted entity keys belonging to the area, directly or via a device.
    pub entities: Vec<EntityKey>,
    pub entity_count: usize,
    pub device_count: usize,
}

/// Aggregated home analysis: the payload of `get_home_info`.
///
/// Recomputed from live registry state on every request; nothing here is
/// cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeReport {
    /// Bounded `[1, 10]` complexity heuristic.
    pub complexity_score: u8,
    pub total_entities: usize,
    pub total_areas: usize,
    pub total_devices: usize,
    /// Every host area plus the synthetic `unassigned` entry.
    pub areas: BTreeMap<AreaKey, AreaInfo>,
    /// Count per category; all categories present, empty ones at zero.
    pub entity_categories: BTreeMap<EntityCategory, usize>,
    pub unassigned_entity_count: usize,
}

/// Derived subscription statistics; no counters are kept alongside the
/// index, so these cannot drift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionStats {
    pub total_connections: usize,
    /// Sum of subscription-set sizes over all connections.
    pub total_subscriptions: usize,
    /// Distinct entities with at least one listener.
    pub unique_entities_monitored: usize,
    pub avg_subscriptions_per_connection: f64,
}
