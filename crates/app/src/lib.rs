//! # dashview-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `EntityRegistry` / `DeviceRegistry` / `AreaRegistry` — read-only
//!     views over the host registries
//!   - `EntityWatcher` — per-entity state-change watch with a
//!     cancel-on-drop guard
//!   - `EventPublisher` — publish state changes to the in-process bus
//! - Provide the **use-case services**:
//!   - `SubscriptionManager` — per-connection entity subscriptions and
//!     state-change fan-out
//!   - `HomeAnalyzer` — complexity score, area membership, categorization
//!   - `EntityMapper` — entity relationships, function groups, priorities
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `dashview-domain` only (plus `tokio::sync` for channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the
//! reverse.

pub mod analyzer;
pub mod entity_mapper;
pub mod event_bus;
pub mod ports;
pub mod subscriptions;
