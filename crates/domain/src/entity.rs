//! Entity — one observable aspect of the home, as read from the host registry.

use serde::{Deserialize, Serialize};

use crate::error::{DashviewError, ValidationError};
use crate::id::{AreaKey, DeviceKey, EntityKey};
use crate::time::{Timestamp, now};

/// Point-in-time state of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// The state value as the host reports it (`"on"`, `"21.5"`, ...).
    pub state: String,
    /// Free-form attribute object attached to the state.
    pub attributes: serde_json::Value,
    /// When the state value last changed.
    pub last_changed: Timestamp,
    /// When the state object was last written (attribute-only updates included).
    pub last_updated: Timestamp,
}

impl StateSnapshot {
    /// Snapshot with the given state value, empty attributes, and current timestamps.
    #[must_use]
    pub fn new(state: impl Into<String>) -> Self {
        let ts = now();
        Self {
            state: state.into(),
            attributes: serde_json::Value::Object(serde_json::Map::new()),
            last_changed: ts,
            last_updated: ts,
        }
    }

    /// Replace the state value, updating both timestamps.
    pub fn update(&mut self, state: impl Into<String>, ts: Timestamp) {
        self.state = state.into();
        self.last_changed = ts;
        self.last_updated = ts;
    }
}

/// A registry entity: key, linkage, and current state.
///
/// Entities are not owned by this core; records are read from the host on
/// demand and never persisted here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Typed `domain.object_id` key.
    pub key: EntityKey,
    /// Human-readable name, when the host has one.
    pub friendly_name: Option<String>,
    /// Owning device, if any.
    pub device_id: Option<DeviceKey>,
    /// Directly assigned area, if any (area may also be inherited through
    /// the device).
    pub area_id: Option<AreaKey>,
    /// Current state.
    pub state: StateSnapshot,
}

impl EntityRecord {
    /// Create a builder for constructing an [`EntityRecord`].
    #[must_use]
    pub fn builder() -> EntityRecordBuilder {
        EntityRecordBuilder::default()
    }
}

/// Step-by-step builder for [`EntityRecord`].
#[derive(Debug, Default)]
pub struct EntityRecordBuilder {
    key: Option<String>,
    friendly_name: Option<String>,
    device_id: Option<DeviceKey>,
    area_id: Option<AreaKey>,
    state: Option<StateSnapshot>,
}

impl EntityRecordBuilder {
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    #[must_use]
    pub fn friendly_name(mut self, name: impl Into<String>) -> Self {
        self.friendly_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn device_id(mut self, device_id: impl Into<DeviceKey>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    #[must_use]
    pub fn area_id(mut self, area_id: impl Into<AreaKey>) -> Self {
        self.area_id = Some(area_id.into());
        self
    }

    #[must_use]
    pub fn state(mut self, state: StateSnapshot) -> Self {
        self.state = Some(state);
        self
    }

    /// Consume the builder, parse the key, and return an [`EntityRecord`].
    ///
    /// # Errors
    ///
    /// Returns [`DashviewError::Validation`] when the key is missing or not
    /// of the form `domain.object_id`.
    pub fn build(self) -> Result<EntityRecord, DashviewError> {
        let key: EntityKey = self
            .key
            .ok_or(ValidationError::MalformedEntityKey {
                value: String::new(),
            })?
            .parse()?;
        Ok(EntityRecord {
            key,
            friendly_name: self.friendly_name,
            device_id: self.device_id,
            area_id: self.area_id,
            state: self.state.unwrap_or_else(|| StateSnapshot::new("unknown")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_build_valid_entity_when_key_provided() {
        let entity = EntityRecord::builder()
            .key("light.living_room")
            .friendly_name("Living Room Light")
            .area_id("living_room")
            .build()
            .unwrap();

        assert_eq!(entity.key.domain(), "light");
        assert_eq!(entity.friendly_name.as_deref(), Some("Living Room Light"));
        assert_eq!(entity.area_id, Some(AreaKey::new("living_room")));
        assert_eq!(entity.state.state, "unknown");
    }

    #[test]
    fn should_return_validation_error_when_key_is_missing() {
        let result = EntityRecord::builder().build();
        assert!(matches!(result, Err(DashviewError::Validation(_))));
    }

    #[test]
    fn should_return_validation_error_when_key_is_malformed() {
        let result = EntityRecord::builder().key("not-an-entity").build();
        assert!(matches!(result, Err(DashviewError::Validation(_))));
    }

    #[test]
    fn should_update_snapshot_state_and_timestamps() {
        let mut snapshot = StateSnapshot::new("off");
        let before = snapshot.last_changed;
        let ts = now();
        snapshot.update("on", ts);

        assert_eq!(snapshot.state, "on");
        assert!(snapshot.last_changed >= before);
        assert_eq!(snapshot.last_changed, snapshot.last_updated);
    }

    #[test]
    fn should_roundtrip_through_serde_json() {
        let entity = EntityRecord::builder()
            .key("sensor.kitchen_temperature")
            .device_id("dev-1")
            .state(StateSnapshot::new("21.5"))
            .build()
            .unwrap();

        let json = serde_json::to_string(&entity).unwrap();
        let parsed: EntityRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.key, entity.key);
        assert_eq!(parsed.state.state, "21.5");
    }
}
