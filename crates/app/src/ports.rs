//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the host it
//! embeds in. They are defined here (in `app`) so that both the use-case
//! layer and the adapter layer can depend on them without creating circular
//! dependencies.

pub mod event_bus;
pub mod registry;
pub mod watch;

pub use event_bus::EventPublisher;
pub use registry::{AreaRegistry, DeviceRegistry, EntityRegistry};
pub use watch::{EntityWatcher, WatchGuard};
