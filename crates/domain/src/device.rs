//! Device — a physical or virtual thing that exposes one or more entities.

use serde::{Deserialize, Serialize};

use crate::error::{DashviewError, ValidationError};
use crate::id::{AreaKey, DeviceKey};

/// A registry device record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub key: DeviceKey,
    pub name: String,
    /// Area the device is located in, if assigned.
    pub area_id: Option<AreaKey>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
}

impl DeviceRecord {
    /// Create a builder for constructing a [`DeviceRecord`].
    #[must_use]
    pub fn builder() -> DeviceRecordBuilder {
        DeviceRecordBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`DashviewError::Validation`] when the key or name is empty.
    pub fn validate(&self) -> Result<(), DashviewError> {
        if self.key.as_str().is_empty() {
            return Err(ValidationError::EmptyKey.into());
        }
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`DeviceRecord`].
#[derive(Debug, Default)]
pub struct DeviceRecordBuilder {
    key: Option<DeviceKey>,
    name: Option<String>,
    area_id: Option<AreaKey>,
    manufacturer: Option<String>,
    model: Option<String>,
}

impl DeviceRecordBuilder {
    #[must_use]
    pub fn key(mut self, key: impl Into<DeviceKey>) -> Self {
        self.key = Some(key.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn area_id(mut self, area_id: impl Into<AreaKey>) -> Self {
        self.area_id = Some(area_id.into());
        self
    }

    #[must_use]
    pub fn manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Consume the builder, validate, and return a [`DeviceRecord`].
    ///
    /// # Errors
    ///
    /// Returns [`DashviewError::Validation`] if the key or name is missing
    /// or empty.
    pub fn build(self) -> Result<DeviceRecord, DashviewError> {
        let device = DeviceRecord {
            key: self.key.unwrap_or_else(|| DeviceKey::new("")),
            name: self.name.unwrap_or_default(),
            area_id: self.area_id,
            manufacturer: self.manufacturer,
            model: self.model,
        };
        device.validate()?;
        Ok(device)
    }
}
