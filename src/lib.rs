//! Nearby mosque lookup with prayer schedules.
//!
//! Places come from a remote directory when one is configured and reachable,
//! otherwise from a built-in list annotated with great-circle distances.

pub mod config;
pub mod geo;
pub mod location;
pub mod places;
pub mod prayer;
pub mod server;
pub mod session;
