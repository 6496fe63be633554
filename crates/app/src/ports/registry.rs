//! Registry ports — read-only views over the host registries.
//!
//! The host owns areas, devices, and entities; this core only reads them.
//! Every query reflects live host state — nothing is cached on this side.

use std::future::Future;
use std::sync::Arc;

use dashview_domain::area::AreaRecord;
use dashview_domain::device::DeviceRecord;
use dashview_domain::entity::EntityRecord;
use dashview_domain::error::DashviewError;
use dashview_domain::id::{AreaKey, DeviceKey, EntityKey};

/// Read-only view over the host entity registry.
pub trait EntityRegistry {
    /// Look up a single entity; `None` when it does not exist.
    fn get_entity(
        &self,
        key: &EntityKey,
    ) -> impl Future<Output = Result<Option<EntityRecord>, DashviewError>> + Send;

    /// Snapshot of all registered entities.
    fn list_entities(
        &self,
    ) -> impl Future<Output = Result<Vec<EntityRecord>, DashviewError>> + Send;
}

/// Read-only view over the host device registry.
pub trait DeviceRegistry {
    /// Look up a single device; `None` when it does not exist.
    fn get_device(
        &self,
        key: &DeviceKey,
    ) -> impl Future<Output = Result<Option<DeviceRecord>, DashviewError>> + Send;

    /// Snapshot of all registered devices.
    fn list_devices(
        &self,
    ) -> impl Future<Output = Result<Vec<DeviceRecord>, DashviewError>> + Send;
}

/// Read-only view over the host area registry.
pub trait AreaRegistry {
    /// Look up a single area; `None` when it does not exist.
    fn get_area(
        &self,
        key: &AreaKey,
    ) -> impl Future<Output = Result<Option<AreaRecord>, DashviewError>> + Send;

    /// Snapshot of all registered areas.
    fn list_areas(&self) -> impl Future<Output = Result<Vec<AreaRecord>, DashviewError>> + Send;
}

impl<T: EntityRegistry + Send + Sync> EntityRegistry for Arc<T> {
    fn get_entity(
        &self,
        key: &EntityKey,
    ) -> impl Future<Output = Result<Option<EntityRecord>, DashviewError>> + Send {
        (**self).get_entity(key)
    }

    fn list_entities(
        &self,
    ) -> impl Future<Output = Result<Vec<EntityRecord>, DashviewError>> + Send {
        (**self).list_entities()
    }
}

impl<T: DeviceRegistry + Send + Sync> DeviceRegistry for Arc<T> {
    fn get_device(
        &self,
        key: &DeviceKey,
    ) -> impl Future<Output = Result<Option<DeviceRecord>, DashviewError>> + Send {
        (**self).get_device(key)
    }

    fn list_devices(
        &self,
    ) -> impl Future<Output = Result<Vec<DeviceRecord>, DashviewError>> + Send {
        (**self).list_devices()
    }
}

impl<T: AreaRegistry + Send + Sync> AreaRegistry for Arc<T> {
    fn get_area(
        &self,
        key: &AreaKey,
    ) -> impl Future<Output = Result<Option<AreaRecord>, DashviewError>> + Send {
        (**self).get_area(key)
    }

    fn list_areas(&self) -> impl Future<Output = Result<Vec<AreaRecord>, DashviewError>> + Send {
        (**self).list_areas()
    }
}
