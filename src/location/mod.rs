//! Location subsystem.
//!
//! Resolves the user's coordinate once per session through a pluggable
//! provider, keeping a fixed default when the provider refuses or fails.

pub mod providers;
pub mod source;
pub mod types;

pub use providers::{
    FixedLocationProvider, IpLocationProvider, LocationProvider, UnavailableProvider,
};
pub use source::{LocationSource, DEFAULT_COORDINATE};
pub use types::{LocationError, LocationFix, LocationOrigin};
