//! Event bus port — publish/subscribe for state-change events.

use std::future::Future;

use dashview_domain::error::DashviewError;
use dashview_domain::event::StateChanged;

/// Publishes state-change events to interested subscribers.
pub trait EventPublisher {
    /// Publish an event to all current subscribers.
    fn publish(
        &self,
        event: StateChanged,
    ) -> impl Future<Output = Result<(), DashviewError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(
        &self,
        event: StateChanged,
    ) -> impl Future<Output = Result<(), DashviewError>> + Send {
        (**self).publish(event)
    }
}
