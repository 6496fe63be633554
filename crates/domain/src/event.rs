//! State-change event pushed to subscribed dashboard connections.

use serde::{Deserialize, Serialize};

use crate::entity::StateSnapshot;
use crate::id::EntityKey;

/// One entity state change, as delivered by the host.
///
/// Either snapshot may be absent: a freshly created entity has no old
/// state, a removed entity has no new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChanged {
    pub entity_id: EntityKey,
    pub old_state: Option<StateSnapshot>,
    pub new_state: Option<StateSnapshot>,
}

impl StateChanged {
    /// Build an event for the given entity.
    #[must_use]
    pub fn new(
        entity_id: EntityKey,
        old_state: Option<StateSnapshot>,
        new_state: Option<StateSnapshot>,
    ) -> Self {
        Self {
            entity_id,
            old_state,
            new_state,
        }
    }
}
