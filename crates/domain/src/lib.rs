//! # dashview-domain
//!
//! Pure domain model for the dashview smart-home dashboard backend.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **entity keys** (`domain.object_id`, parsed once at ingestion)
//! - Define registry records (**entities**, **devices**, **areas**) as read
//!   from the host
//! - Define **state-change events** pushed to dashboard connections
//! - Define the dashboard taxonomies (**categories**, **function groups**,
//!   **priorities**) and the derived analysis records (`AreaInfo`,
//!   `HomeReport`, `EntityRelationship`, `SubscriptionStats`)
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod analysis;
pub mod area;
pub mod category;
pub mod device;
pub mod entity;
pub mod event;
pub mod relationship;
