//! Mapping application errors to protocol error envelopes.

use dashview_domain::error::DashviewError;

use crate::protocol::ErrorFrame;

/// Map a [`DashviewError`] to an error frame for the given request.
///
/// Registry failures are logged here and surfaced with a generic message;
/// the host-side detail stays in the server log.
#[must_use]
pub fn error_frame(id: u64, err: &DashviewError) -> ErrorFrame {
    match err {
        DashviewError::Validation(err) => ErrorFrame::new(Some(id), "invalid_format", err.to_string()),
        DashviewError::NotFound(err) => ErrorFrame::new(Some(id), "not_found", err.to_string()),
        DashviewError::Registry(err) => {
            tracing::error!(error = %err, "registry error");
            ErrorFrame::new(Some(id), "registry_error", "registry query failed")
        }
    }
}
