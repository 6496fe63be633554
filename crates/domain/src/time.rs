//! Clock access for state snapshots and change events.
//!
//! Snapshots carry the instant they were taken and events the instant the
//! change was observed; both come from here, so this is the only place the
//! crate reads the wall clock.

use chrono::{DateTime, Utc};

/// UTC instant attached to a [`StateSnapshot`](crate::entity::StateSnapshot)
/// or a [`StateChanged`](crate::event::StateChanged) event.
pub type Timestamp = DateTime<Utc>;

/// Current wall-clock instant in UTC.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}
