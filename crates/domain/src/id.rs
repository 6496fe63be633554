//! Typed identifiers: entity keys, registry keys, connection ids.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Typed entity identifier of the form `domain.object_id`.
///
/// The domain implies the functional kind of the entity (`light`, `sensor`,
/// `switch`, ...). Parsing happens once at ingestion; everything downstream
/// works with the split fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityKey {
    domain: String,
    object_id: String,
}

impl EntityKey {
    /// Build a key from already-split segments.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MalformedEntityKey`] when either segment
    /// is empty or contains a `.`.
    pub fn new(
        domain: impl Into<String>,
        object_id: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let domain = domain.into();
        let object_id = object_id.into();
        if domain.is_empty()
            || domain.contains('.')
            || object_id.is_empty()
            || object_id.contains('.')
        {
            return Err(ValidationError::MalformedEntityKey {
                value: format!("{domain}.{object_id}"),
            });
        }
        Ok(Self { domain, object_id })
    }

    /// The functional kind (`light`, `sensor`, ...).
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// The part after the dot.
    #[must_use]
    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    /// First `_`-separated token of the object id, used as the
    /// name-prefix grouping heuristic (`living_room_lamp` -> `living`).
    #[must_use]
    pub fn prefix_token(&self) -> &str {
        self.object_id
            .split('_')
            .next()
            .unwrap_or(&self.object_id)
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.domain, self.object_id)
    }
}

impl FromStr for EntityKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (domain, object_id) =
            s.split_once('.')
                .ok_or_else(|| ValidationError::MalformedEntityKey {
                    value: s.to_string(),
                })?;
        Self::new(domain, object_id)
    }
}

impl TryFrom<String> for EntityKey {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EntityKey> for String {
    fn from(key: EntityKey) -> Self {
        key.to_string()
    }
}

macro_rules! define_key {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a host-provided key.
            #[must_use]
            pub fn new(key: impl Into<String>) -> Self {
                Self(key.into())
            }

            /// Access the inner string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

define_key!(
    /// Host key for an [`AreaRecord`](crate::area::AreaRecord).
    AreaKey
);

define_key!(
    /// Host key for a [`DeviceRecord`](crate::device::DeviceRecord).
    DeviceKey
);

impl AreaKey {
    /// Synthetic pseudo-area collecting entities without any area linkage.
    #[must_use]
    pub fn unassigned() -> Self {
        Self("unassigned".to_string())
    }
}

/// Unique identifier for one live dashboard connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(uuid::Uuid);

impl Default for ConnectionId {
    fn default() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl ConnectionId {
    /// Generate a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
