//! Session location: ask the provider once, fall back to a fixed default.

use super::providers::LocationProvider;
use super::types::{LocationFix, LocationOrigin};
use crate::geo::Coordinate;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// City-centre fallback (Masjid al-Haram, Mecca).
pub const DEFAULT_COORDINATE: Coordinate = Coordinate { lat: 21.4225, lng: 39.8262 };

/// Holds the current coordinate for the session.
///
/// The provider is consulted at most once. Until that happens, and forever
/// after a denial, `current()` reports the default coordinate.
pub struct LocationSource {
    provider: Arc<dyn LocationProvider>,
    default: Coordinate,
    fix: OnceCell<LocationFix>,
}

impl LocationSource {
    pub fn new(provider: Arc<dyn LocationProvider>, default: Coordinate) -> Self {
        Self { provider, default, fix: OnceCell::new() }
    }

    pub fn with_default_coordinate(provider: Arc<dyn LocationProvider>) -> Self {
        Self::new(provider, DEFAULT_COORDINATE)
    }

    /// Resolve the session location. Concurrent and repeated callers all
    /// observe the first (and only) provider result.
    pub async fn resolve(&self) -> &LocationFix {
        self.fix
            .get_or_init(|| async {
                match self.provider.current_position().await {
                    Ok(coordinate) => {
                        info!(
                            provider = self.provider.name(),
                            lat = coordinate.lat,
                            lng = coordinate.lng,
                            "location resolved"
                        );
                        LocationFix {
                            coordinate,
                            origin: LocationOrigin::Device,
                            note: Some(self.provider.name().to_string()),
                        }
                    }
                    Err(e) => {
                        warn!(
                            provider = self.provider.name(),
                            error = %e,
                            "location unavailable, using default"
                        );
                        LocationFix {
                            coordinate: self.default,
                            origin: LocationOrigin::Default,
                            note: Some(e.to_string()),
                        }
                    }
                }
            })
            .await
    }

    /// The coordinate as of now, without waiting on the provider.
    pub fn current(&self) -> Coordinate {
        self.fix.get().map(|f| f.coordinate).unwrap_or(self.default)
    }

    pub fn is_resolved(&self) -> bool {
        self.fix.initialized()
    }
}
