//! # dashview-adapter-ws-axum
//!
//! Websocket adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the dashboard **websocket command surface** at `/ws`
//!   (home info, subscriptions, relationships, stats)
//! - Push **state-change events** to connections that subscribed to the
//!   affected entity
//! - Map websocket frames into application calls (driving adapter)
//! - Map application results and errors into protocol envelopes
//!
//! ## Dependency rule
//! Depends on `dashview-app` (for port traits and services) and
//! `dashview-domain` (for domain types used in frame mapping). Never leaks
//! axum types into the domain.

pub mod commands;
pub mod connection;
pub mod error;
pub mod protocol;
pub mod router;
pub mod state;
