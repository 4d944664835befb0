//! Storage layer module.
//!
//! This module provides the trait-based reservation store abstraction and its
//! two backends, so the rest of the service never depends on which one runs.

pub mod factory;
pub mod local;
pub mod remote;
pub mod subscription;
pub mod traits;

pub use factory::create_store;
pub use subscription::BoardSubscription;
pub use traits::ReservationStore;
