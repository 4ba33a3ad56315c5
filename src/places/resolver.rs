//! Nearby-places resolver: remote directory first, built-in list on failure.
//!
//! Remote flow:   directory.nearby(coord) → non-empty → Remote result
//! Fallback flow: not configured | error | empty → annotated built-in list

use super::fallback;
use super::remote::{PlaceDirectory, RemoteConfig, RemoteError, RestDirectory};
use super::types::{FallbackReason, NewPlace, Place, ResolutionResult};
use crate::geo::Coordinate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// What to do when the backend answers successfully with zero places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyRemotePolicy {
    /// Treat an empty answer like a failure and show the built-in list.
    #[default]
    Fallback,
    /// An empty neighbourhood is a real answer; return it as-is.
    Accept,
}

/// Resolves the list of places near a coordinate. Never fails.
pub struct NearbyPlacesResolver {
    directory: Option<Arc<dyn PlaceDirectory>>,
    dataset: Vec<Place>,
    empty_policy: EmptyRemotePolicy,
}

impl NearbyPlacesResolver {
    /// Build from optional backend settings. `None` means every resolution
    /// goes straight to the built-in list.
    pub fn new(remote: Option<RemoteConfig>) -> Self {
        let directory =
            remote.map(|cfg| Arc::new(RestDirectory::new(cfg)) as Arc<dyn PlaceDirectory>);
        Self::with_directory(directory)
    }

    pub fn with_directory(directory: Option<Arc<dyn PlaceDirectory>>) -> Self {
        Self {
            directory,
            dataset: fallback::static_places(),
            empty_policy: EmptyRemotePolicy::default(),
        }
    }

    /// Replace the built-in fallback list.
    pub fn with_dataset(mut self, dataset: Vec<Place>) -> Self {
        self.dataset = dataset;
        self
    }

    pub fn with_empty_policy(mut self, policy: EmptyRemotePolicy) -> Self {
        self.empty_policy = policy;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.directory.is_some()
    }

    /// One remote attempt, no retries. All remote errors end up as a
    /// fallback reason.
    pub async fn resolve(&self, coordinate: Coordinate) -> ResolutionResult {
        let reason = match self.remote_tier(coordinate).await {
            Ok(places) => {
                info!(count = places.len(), "nearby places from backend");
                return ResolutionResult::remote(places);
            }
            Err(reason) => reason,
        };

        warn!(reason = %reason, "using built-in place list");
        ResolutionResult::local_fallback(fallback::annotate(&self.dataset, coordinate), reason)
    }

    async fn remote_tier(&self, coordinate: Coordinate) -> Result<Vec<Place>, FallbackReason> {
        let directory = self.directory.as_ref().ok_or(FallbackReason::NotConfigured)?;

        let places = directory
            .nearby(coordinate)
            .await
            .map_err(|e| FallbackReason::RemoteFailed(e.to_string()))?;

        if places.is_empty() && self.empty_policy == EmptyRemotePolicy::Fallback {
            return Err(FallbackReason::RemoteEmpty);
        }
        Ok(places)
    }

    /// Validate an admin submission and forward it to the backend.
    pub async fn submit(&self, place: &NewPlace) -> Result<NewPlace, RemoteError> {
        let place = place.validated()?;
        let directory = self.directory.as_ref().ok_or(RemoteError::NotConfigured)?;
        directory.submit(&place).await?;
        info!(name = %place.name, "place submitted");
        Ok(place)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::prayer::ScheduleTimes;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory directory with scripted answers.
    pub(crate) struct FakeDirectory {
        pub nearby: Result<Vec<Place>, RemoteError>,
        pub calls: AtomicUsize,
        pub submitted: Mutex<Vec<NewPlace>>,
    }

    impl FakeDirectory {
        pub(crate) fn answering(nearby: Result<Vec<Place>, RemoteError>) -> Arc<Self> {
            Arc::new(Self { nearby, calls: AtomicUsize::new(0), submitted: Mutex::new(Vec::new()) })
        }
    }

    #[async_trait]
    impl PlaceDirectory for FakeDirectory {
        async fn nearby(&self, _coordinate: Coordinate) -> Result<Vec<Place>, RemoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.nearby.clone()
        }

        async fn submit(&self, place: &NewPlace) -> Result<(), RemoteError> {
            self.submitted.lock().unwrap().push(place.clone());
            Ok(())
        }
    }

    pub(crate) fn as_directory(dir: &Arc<FakeDirectory>) -> Option<Arc<dyn PlaceDirectory>> {
        Some(dir.clone() as Arc<dyn PlaceDirectory>)
    }

    pub(crate) fn remote_place(id: &str, distance: f64) -> Place {
        Place {
            id: id.into(),
            name: format!("Remote {}", id),
            coordinate: Coordinate { lat: 21.44, lng: 39.84 },
            address: None,
            schedule_times: ScheduleTimes::new("05:30", "12:30", "15:50", "18:15", "19:45"),
            distance_meters: Some(distance),
        }
    }

    fn origin() -> Coordinate {
        Coordinate::new(21.4225, 39.8262).unwrap()
    }

    fn assert_local_fallback(result: &ResolutionResult, reason: FallbackReason) {
        assert!(result.is_degraded());
        assert_eq!(result.fallback_reason, Some(reason));
        assert_eq!(result.places.len(), fallback::static_places().len());
        assert!(result.places.iter().all(|p| p.distance_meters.is_some_and(|d| d >= 0.0)));
    }

    #[tokio::test]
    async fn test_remote_non_empty_returned_unmodified() {
        let places = vec![remote_place("9", 5000.0), remote_place("3", 200.0)];
        let dir = FakeDirectory::answering(Ok(places.clone()));
        let resolver = NearbyPlacesResolver::with_directory(as_directory(&dir));

        let result = resolver.resolve(origin()).await;
        assert!(!result.is_degraded());
        assert_eq!(result.places, places);
        assert_eq!(result.fallback_reason, None);
        assert_eq!(dir.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_not_configured_falls_back() {
        let resolver = NearbyPlacesResolver::new(None);
        assert!(!resolver.is_configured());
        let result = resolver.resolve(origin()).await;
        assert_local_fallback(&result, FallbackReason::NotConfigured);
    }

    #[tokio::test]
    async fn test_remote_error_falls_back() {
        let dir = FakeDirectory::answering(Err(RemoteError::Network("connection refused".into())));
        let resolver = NearbyPlacesResolver::with_directory(as_directory(&dir));
        let result = resolver.resolve(origin()).await;
        assert_local_fallback(
            &result,
            FallbackReason::RemoteFailed("network error: connection refused".into()),
        );
        // Single attempt, no retries.
        assert_eq!(dir.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_malformed_response_falls_back() {
        let bad = RemoteError::InvalidResponse("expected array".into());
        let dir = FakeDirectory::answering(Err(bad));
        let resolver = NearbyPlacesResolver::with_directory(as_directory(&dir));
        let result = resolver.resolve(origin()).await;
        assert!(result.is_degraded());
    }

    // An empty neighbourhood is treated like an outage by default. This is
    // a policy choice: the built-in list is shown even though the backend
    // answered.
    #[tokio::test]
    async fn test_remote_empty_falls_back_by_default() {
        let dir = FakeDirectory::answering(Ok(vec![]));
        let resolver = NearbyPlacesResolver::with_directory(as_directory(&dir));
        let result = resolver.resolve(origin()).await;
        assert_local_fallback(&result, FallbackReason::RemoteEmpty);
    }

    #[tokio::test]
    async fn test_remote_empty_accepted_when_configured() {
        let dir = FakeDirectory::answering(Ok(vec![]));
        let resolver = NearbyPlacesResolver::with_directory(as_directory(&dir))
            .with_empty_policy(EmptyRemotePolicy::Accept);
        let result = resolver.resolve(origin()).await;
        assert!(!result.is_degraded());
        assert!(result.places.is_empty());
    }

    #[tokio::test]
    async fn test_fallback_distances_use_caller_coordinate() {
        let dataset = vec![remote_place("a", 0.0)];
        let resolver = NearbyPlacesResolver::new(None).with_dataset(dataset.clone());
        let here = Coordinate::new(21.44, 39.84).unwrap();
        let far = Coordinate::new(24.47, 39.61).unwrap();

        let near_result = resolver.resolve(here).await;
        let far_result = resolver.resolve(far).await;
        assert!(near_result.places[0].distance_meters.unwrap() < 1e-6);
        assert!(far_result.places[0].distance_meters.unwrap() > 300_000.0);
        // The dataset itself is untouched.
        assert_eq!(dataset[0].distance_meters, Some(0.0));
    }

    #[tokio::test]
    async fn test_resolve_is_idempotent() {
        let answers = [
            Ok(vec![remote_place("1", 10.0)]),
            Ok(vec![]),
            Err(RemoteError::NotConfigured),
        ];
        for answer in answers {
            let dir = FakeDirectory::answering(answer);
            let resolver = NearbyPlacesResolver::with_directory(as_directory(&dir));
            let a = resolver.resolve(origin()).await;
            let b = resolver.resolve(origin()).await;
            assert_eq!(a, b);
        }
    }

    #[tokio::test]
    async fn test_submit_validates_and_forwards() {
        let dir = FakeDirectory::answering(Ok(vec![]));
        let resolver = NearbyPlacesResolver::with_directory(as_directory(&dir));
        let form = NewPlace {
            name: " Masjid Bilal ".into(),
            coordinate: origin(),
            address: None,
            schedule_times: ScheduleTimes::default(),
        };

        let stored = resolver.submit(&form).await.unwrap();
        assert_eq!(stored.name, "Masjid Bilal");
        assert_eq!(dir.submitted.lock().unwrap().len(), 1);

        let bad = NewPlace { name: "".into(), ..form };
        assert!(matches!(resolver.submit(&bad).await, Err(RemoteError::InvalidPlace(_))));
        assert_eq!(dir.submitted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_without_backend() {
        let form = NewPlace {
            name: "Masjid".into(),
            coordinate: origin(),
            address: None,
            schedule_times: ScheduleTimes::default(),
        };
        let err = NearbyPlacesResolver::new(None).submit(&form).await.unwrap_err();
        assert_eq!(err, RemoteError::NotConfigured);
    }
}
