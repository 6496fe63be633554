//! # dashview-adapter-virtual
//!
//! Virtual hub standing in for a real smart-home host: in-memory area,
//! device, and entity registries plus per-entity watch bookkeeping. Used by
//! the demo binary and the integration tests.
//!
//! State changes are published on an in-process event bus, but only for
//! entities that currently have at least one active watch — exactly the
//! contract the subscription manager establishes with its watch guards.
//!
//! ## Dependency rule
//!
//! Depends on `dashview-app` (port traits, event bus) and
//! `dashview-domain` only.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock};

use tokio::sync::broadcast;

use dashview_app::event_bus::InProcessEventBus;
use dashview_app::ports::{
    AreaRegistry, DeviceRegistry, EntityRegistry, EntityWatcher, EventPublisher, WatchGuard,
};
use dashview_domain::area::AreaRecord;
use dashview_domain::device::DeviceRecord;
use dashview_domain::entity::EntityRecord;
use dashview_domain::error::{DashviewError, NotFoundError};
use dashview_domain::event::StateChanged;
use dashview_domain::id::{AreaKey, DeviceKey, EntityKey};
use dashview_domain::time::now;

const EVENT_BUS_CAPACITY: usize = 256;

#[derive(Default)]
struct HubState {
    entities: HashMap<EntityKey, EntityRecord>,
    devices: HashMap<DeviceKey, DeviceRecord>,
    areas: HashMap<AreaKey, AreaRecord>,
    /// Active watch refcount per entity; absent means not watched.
    watched: HashMap<EntityKey, usize>,
}

/// In-memory hub: registries, watches, and a state-change bus.
pub struct VirtualHub {
    state: Arc<RwLock<HubState>>,
    bus: InProcessEventBus,
}

impl Default for VirtualHub {
    fn default() -> Self {
        Self {
            state: Arc::new(RwLock::new(HubState::default())),
            bus: InProcessEventBus::new(EVENT_BUS_CAPACITY),
        }
    }
}

impl VirtualHub {
    /// Empty hub with no registered records.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hub pre-seeded with a small demo home: three areas, a handful of
    /// devices, and entities across the common domains.
    #[must_use]
    pub fn with_demo_home() -> Self {
        let hub = Self::new();
        hub.seed_demo_home();
        hub
    }

    /// Subscribe to state-change events published by this hub.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<StateChanged> {
        self.bus.subscribe()
    }

    /// Register or replace an area.
    pub fn insert_area(&self, area: AreaRecord) {
        self.write().areas.insert(area.key.clone(), area);
    }

    /// Register or replace a device.
    pub fn insert_device(&self, device: DeviceRecord) {
        self.write().devices.insert(device.key.clone(), device);
    }

    /// Register or replace an entity.
    pub fn insert_entity(&self, entity: EntityRecord) {
        self.write().entities.insert(entity.key.clone(), entity);
    }

    /// Whether the entity currently has at least one active watch.
    #[must_use]
    pub fn is_watched(&self, key: &EntityKey) -> bool {
        self.read().watched.contains_key(key)
    }

    /// Update an entity's state value.
    ///
    /// Publishes a [`StateChanged`] event carrying the previous snapshot,
    /// but only when the entity is watched; unwatched changes are applied
    /// silently.
    ///
    /// # Errors
    ///
    /// Returns [`DashviewError::NotFound`] when the entity is not
    /// registered.
    pub async fn set_state(
        &self,
        key: &EntityKey,
        state: impl Into<String>,
    ) -> Result<(), DashviewError> {
        let event = {
            let mut guard = self.write();
            let inner = &mut *guard;
            let entity = inner.entities.get_mut(key).ok_or_else(|| NotFoundError {
                kind: "Entity",
                id: key.to_string(),
            })?;
            let old_state = entity.state.clone();
            entity.state.update(state, now());
            inner
                .watched
                .contains_key(key)
                .then(|| StateChanged::new(key.clone(), Some(old_state), Some(entity.state.clone())))
        };

        if let Some(event) = event {
            self.bus.publish(event).await?;
        }
        Ok(())
    }

    fn seed_demo_home(&self) {
        for (key, name) in [
            ("living_room", "Living Room"),
            ("kitchen", "Kitchen"),
            ("bedroom", "Bedroom"),
        ] {
            if let Ok(area) = AreaRecord::builder().key(key).name(name).build() {
                self.insert_area(area);
            }
        }

        for (key, name, area) in [
            ("hue-bridge", "Hue Bridge", Some("living_room")),
            ("climate-hub", "Climate Hub", Some("bedroom")),
            ("roaming-speaker", "Roaming Speaker", None),
        ] {
            let mut builder = DeviceRecord::builder().key(key).name(name);
            if let Some(area) = area {
                builder = builder.area_id(area);
            }
            if let Ok(device) = builder.build() {
                self.insert_device(device);
            }
        }

        for (key, name, area, device, state) in [
            (
                "light.living_room",
                "Living Room Light",
                Some("living_room"),
                Some("hue-bridge"),
                "off",
            ),
            (
                "sensor.living_room_temperature",
                "Living Room Temperature",
                Some("living_room"),
                None,
                "21.5",
            ),
            (
                "media_player.living_room_tv",
                "Living Room TV",
                Some("living_room"),
                None,
                "idle",
            ),
            (
                "light.kitchen",
                "Kitchen Light",
                Some("kitchen"),
                Some("hue-bridge"),
                "on",
            ),
            (
                "switch.kitchen_coffee_maker",
                "Coffee Maker",
                Some("kitchen"),
                None,
                "off",
            ),
            (
                "sensor.bedroom_humidity",
                "Bedroom Humidity",
                None,
                Some("climate-hub"),
                "48",
            ),
            (
                "climate.bedroom",
                "Bedroom Thermostat",
                Some("bedroom"),
                Some("climate-hub"),
                "heat",
            ),
            (
                "media_player.portable_speaker",
                "Portable Speaker",
                None,
                Some("roaming-speaker"),
                "idle",
            ),
            (
                "binary_sensor.front_door",
                "Front Door",
                None,
                None,
                "off",
            ),
        ] {
            let mut builder = EntityRecord::builder()
                .key(key)
                .friendly_name(name)
                .state(dashview_domain::entity::StateSnapshot::new(state));
            if let Some(area) = area {
                builder = builder.area_id(area);
            }
            if let Some(device) = device {
                builder = builder.device_id(device);
            }
            if let Ok(entity) = builder.build() {
                self.insert_entity(entity);
            }
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HubState> {
        self.state.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HubState> {
        self.state.write().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl EntityRegistry for VirtualHub {
    fn get_entity(
        &self,
        key: &EntityKey,
    ) -> impl Future<Output = Result<Option<EntityRecord>, DashviewError>> + Send {
        let found = self.read().entities.get(key).cloned();
        async { Ok(found) }
    }

    fn list_entities(
        &self,
    ) -> impl Future<Output = Result<Vec<EntityRecord>, DashviewError>> + Send {
        let mut all: Vec<EntityRecord> = self.read().entities.values().cloned().collect();
        all.sort_by(|a, b| a.key.cmp(&b.key));
        async { Ok(all) }
    }
}

impl DeviceRegistry for VirtualHub {
    fn get_device(
        &self,
        key: &DeviceKey,
    ) -> impl Future<Output = Result<Option<DeviceRecord>, DashviewError>> + Send {
        let found = self.read().devices.get(key).cloned();
        async { Ok(found) }
    }

    fn list_devices(
        &self,
    ) -> impl Future<Output = Result<Vec<DeviceRecord>, DashviewError>> + Send {
        let mut all: Vec<DeviceRecord> = self.read().devices.values().cloned().collect();
        all.sort_by(|a, b| a.key.cmp(&b.key));
        async { Ok(all) }
    }
}

impl AreaRegistry for VirtualHub {
    fn get_area(
        &self,
        key: &AreaKey,
    ) -> impl Future<Output = Result<Option<AreaRecord>, DashviewError>> + Send {
        let found = self.read().areas.get(key).cloned();
        async { Ok(found) }
    }

    fn list_areas(&self) -> impl Future<Output = Result<Vec<AreaRecord>, DashviewError>> + Send {
        let mut all: Vec<AreaRecord> = self.read().areas.values().cloned().collect();
        all.sort_by(|a, b| a.key.cmp(&b.key));
        async { Ok(all) }
    }
}

impl EntityWatcher for VirtualHub {
    fn watch(&self, key: &EntityKey) -> WatchGuard {
        *self.write().watched.entry(key.clone()).or_insert(0) += 1;

        let state = Arc::clone(&self.state);
        let key = key.clone();
        WatchGuard::new(move || {
            let mut inner = state
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if let Some(count) = inner.watched.get_mut(&key) {
                *count -= 1;
                if *count == 0 {
                    inner.watched.remove(&key);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> EntityKey {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn should_expose_seeded_demo_records() {
        let hub = VirtualHub::with_demo_home();

        assert_eq!(hub.list_areas().await.unwrap().len(), 3);
        assert_eq!(hub.list_devices().await.unwrap().len(), 3);
        assert_eq!(hub.list_entities().await.unwrap().len(), 9);

        let light = hub
            .get_entity(&key("light.living_room"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(light.friendly_name.as_deref(), Some("Living Room Light"));
        assert_eq!(light.state.state, "off");
    }

    #[tokio::test]
    async fn should_return_none_for_unknown_records() {
        let hub = VirtualHub::new();
        assert!(hub.get_entity(&key("light.ghost")).await.unwrap().is_none());
        assert!(hub.get_area(&AreaKey::new("attic")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_apply_state_change_silently_when_unwatched() {
        let hub = VirtualHub::with_demo_home();
        let mut events = hub.events();

        hub.set_state(&key("light.living_room"), "on").await.unwrap();

        let light = hub
            .get_entity(&key("light.living_room"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(light.state.state, "on");
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn should_publish_state_change_when_watched() {
        let hub = VirtualHub::with_demo_home();
        let mut events = hub.events();
        let _guard = hub.watch(&key("light.living_room"));

        hub.set_state(&key("light.living_room"), "on").await.unwrap();

        let event = events.recv().await.unwrap();
        assert_eq!(event.entity_id, key("light.living_room"));
        assert_eq!(event.old_state.unwrap().state, "off");
        assert_eq!(event.new_state.unwrap().state, "on");
    }

    #[tokio::test]
    async fn should_stop_publishing_after_last_guard_drops() {
        let hub = VirtualHub::with_demo_home();
        let mut events = hub.events();

        let first = hub.watch(&key("light.kitchen"));
        let second = hub.watch(&key("light.kitchen"));
        drop(first);
        assert!(hub.is_watched(&key("light.kitchen")));

        drop(second);
        assert!(!hub.is_watched(&key("light.kitchen")));

        hub.set_state(&key("light.kitchen"), "off").await.unwrap();
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn should_return_not_found_for_unknown_entity_state() {
        let hub = VirtualHub::new();
        let result = hub.set_state(&key("light.ghost"), "on").await;
        assert!(matches!(result, Err(DashviewError::NotFound(_))));
    }
}
