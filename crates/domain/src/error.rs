//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts via `#[from]`.
//! No `String` variants at the top level.

/// Top-level error for the dashview core.
#[derive(Debug, thiserror::Error)]
pub enum DashviewError {
    /// A domain invariant was violated.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A referenced record does not exist.
    #[error("{0}")]
    NotFound(#[from] NotFoundError),

    /// The host registry failed while answering a query.
    #[error("{0}")]
    Registry(#[from] RegistryError),
}

/// Domain invariant violations.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// An entity key was empty or missing a segment.
    #[error("entity key must be of the form `domain.object_id`, got {value:?}")]
    MalformedEntityKey {
        /// The offending input.
        value: String,
    },

    /// A registry key (area/device) was empty.
    #[error("key must not be empty")]
    EmptyKey,

    /// A display name was empty.
    #[error("name must not be empty")]
    EmptyName,
}

/// A referenced record does not exist.
#[derive(Debug, thiserror::Error)]
#[error("{kind} {id} not found")]
pub struct NotFoundError {
    /// Record kind ("Entity", "Area", ...).
    pub kind: &'static str,
    /// The identifier that was looked up.
    pub id: String,
}

/// The host registry failed while answering a query.
#[derive(Debug, thiserror::Error)]
#[error("registry unavailable: {message}")]
pub struct RegistryError {
    /// Host-provided failure description.
    pub message: String,
}

impl RegistryError {
    /// Wrap a host failure message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_render_not_found_with_kind_and_id() {
        let err = NotFoundError {
            kind: "Area",
            id: "attic".to_string(),
        };
        assert_eq!(err.to_string(), "Area attic not found");
    }

    #[test]
    fn should_convert_validation_error_into_dashview_error() {
        let err: DashviewError = ValidationError::EmptyName.into();
        assert!(matches!(err, DashviewError::Validation(_)));
    }

    #[test]
    fn should_render_registry_error_message() {
        let err = RegistryError::new("connection reset");
        assert_eq!(err.to_string(), "registry unavailable: connection reset");
    }
}
