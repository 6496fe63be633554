//! Area — a host-defined physical grouping (room) for devices and entities.

use serde::{Deserialize, Serialize};

use crate::error::{DashviewError, ValidationError};
use crate::id::AreaKey;

/// A registry area record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaRecord {
    pub key: AreaKey,
    pub name: String,
}

impl AreaRecord {
    /// Create a builder for constructing an [`AreaRecord`].
    #[must_use]
    pub fn builder() -> AreaRecordBuilder {
        AreaRecordBuilder::default()
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

/// Step-by-step builder for [`AreaRecord`].
#[derive(Debug, Default)]
pub struct AreaRecordBuilder {
    key: Option<AreaKey>,
    name: Option<String>,
}

impl AreaRecordBuilder {
    #[must_use]
    pub fn key(mut self, key: impl Into<AreaKey>) -> Self {
        self.key = Some(key.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Consume the builder, validate, and return an [`AreaRecord`].
    ///
    /// # Errors
    ///
    /// Returns [`DashviewError::Validation`] if the key or name is missing
    /// or empty.
    pub fn build(self) -> Result<AreaRecord, DashviewError> {
        let area = AreaRecord {
            key: self.key.unwrap_or_else(|| AreaKey::new("")),
            name: self.name.unwrap_or_default(),
        };
        area.validate()?;
        Ok(area)
    }
}
