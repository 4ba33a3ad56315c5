//! Nearby places: remote directory with a built-in fallback list.

pub mod fallback;
pub mod remote;
pub mod resolver;
pub mod types;

pub use remote::{PlaceDirectory, RemoteConfig, RemoteError, RestDirectory};
pub use resolver::{EmptyRemotePolicy, NearbyPlacesResolver};
pub use types::{
    FallbackReason, NewPlace, Place, PlaceValidationError, Provenance, ResolutionResult,
};
