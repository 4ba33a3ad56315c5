//! Place records and resolution results.

use crate::geo::{Coordinate, CoordinateError};
use crate::prayer::{ScheduleTimes, MISSING_TIME};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A place of worship as shown in the nearby list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: String,
    pub name: String,
    pub coordinate: Coordinate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub schedule_times: ScheduleTimes,
    /// Filled by the remote directory, or computed locally in fallback mode.
    pub distance_meters: Option<f64>,
}

impl Place {
    /// A copy of this place annotated with its distance from `origin`.
    pub fn with_distance_from(&self, origin: Coordinate) -> Place {
        Place {
            distance_meters: Some(crate::geo::haversine_meters(origin, self.coordinate)),
            ..self.clone()
        }
    }
}

/// Which tier produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Remote,
    LocalFallback,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote => write!(f, "Remote"),
            Self::LocalFallback => write!(f, "Local fallback"),
        }
    }
}

/// Why the local tier was used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FallbackReason {
    NotConfigured,
    RemoteFailed(String),
    RemoteEmpty,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "backend not configured"),
            Self::RemoteFailed(e) => write!(f, "backend request failed: {}", e),
            Self::RemoteEmpty => write!(f, "backend returned no places"),
        }
    }
}

/// Ordered places plus provenance. Recomputed on every resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionResult {
    pub places: Vec<Place>,
    pub provenance: Provenance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<FallbackReason>,
}

impl ResolutionResult {
    pub fn remote(places: Vec<Place>) -> Self {
        Self { places, provenance: Provenance::Remote, fallback_reason: None }
    }

    pub fn local_fallback(places: Vec<Place>, reason: FallbackReason) -> Self {
        Self { places, provenance: Provenance::LocalFallback, fallback_reason: Some(reason) }
    }

    /// True when the presentation layer should show the demo-mode banner.
    pub fn is_degraded(&self) -> bool {
        self.provenance == Provenance::LocalFallback
    }
}

/// A new entry submitted through the admin form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPlace {
    pub name: String,
    pub coordinate: Coordinate,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub schedule_times: ScheduleTimes,
}

const MAX_NAME_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlaceValidationError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("name longer than 200 characters")]
    NameTooLong,
    #[error(transparent)]
    Coordinate(#[from] CoordinateError),
    #[error("{prayer} time '{value}' is not HH:MM")]
    BadTime { prayer: String, value: String },
}

impl NewPlace {
    /// Check the form before it reaches the backend. Returns a trimmed copy.
    pub fn validated(&self) -> Result<NewPlace, PlaceValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(PlaceValidationError::EmptyName);
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(PlaceValidationError::NameTooLong);
        }
        let coordinate = self.coordinate.validate()?;

        let mut schedule_times = self.schedule_times.clone();
        let ScheduleTimes { fajr, dhuhr, asr, maghrib, isha } = &mut schedule_times;
        for slot in [fajr, dhuhr, asr, maghrib, isha] {
            *slot = slot.trim().to_string();
        }

        for (prayer, value) in schedule_times.iter() {
            if value.is_empty() || value == MISSING_TIME {
                continue;
            }
            if NaiveTime::parse_from_str(value, "%H:%M").is_err() {
                return Err(PlaceValidationError::BadTime {
                    prayer: prayer.to_string(),
                    value: value.to_string(),
                });
            }
        }

        Ok(NewPlace {
            name: name.to_string(),
            coordinate,
            address: self
                .address
                .as_deref()
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(String::from),
            schedule_times,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> NewPlace {
        NewPlace {
            name: "  Masjid Quba  ".into(),
            coordinate: Coordinate { lat: 24.4393, lng: 39.6173 },
            address: Some("   ".into()),
            schedule_times: ScheduleTimes::new("05:20", "12:25", "15:45", "18:10", "--:--"),
        }
    }

    #[test]
    fn test_validated_trims() {
        let v = form().validated().unwrap();
        assert_eq!(v.name, "Masjid Quba");
        assert_eq!(v.address, None);
    }

    #[test]
    fn test_validated_trims_time_slots() {
        let mut f = form();
        f.schedule_times.fajr = " 05:20 ".into();
        f.schedule_times.isha = "\t19:40".into();
        let v = f.validated().unwrap();
        let expected = ScheduleTimes::new("05:20", "12:25", "15:45", "18:10", "19:40");
        assert_eq!(v.schedule_times, expected);
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut f = form();
        f.name = "   ".into();
        assert_eq!(f.validated(), Err(PlaceValidationError::EmptyName));
    }

    #[test]
    fn test_bad_coordinate_rejected() {
        let mut f = form();
        f.coordinate.lat = 95.0;
        assert!(matches!(f.validated(), Err(PlaceValidationError::Coordinate(_))));
    }

    #[test]
    fn test_bad_time_rejected() {
        let mut f = form();
        f.schedule_times.asr = "3.45pm".into();
        let err = f.validated().unwrap_err();
        assert_eq!(err.to_string(), "Asr time '3.45pm' is not HH:MM");
    }

    #[test]
    fn test_with_distance_does_not_mutate() {
        let place = Place {
            id: "p1".into(),
            name: "Test".into(),
            coordinate: Coordinate { lat: 21.43, lng: 39.835 },
            address: None,
            schedule_times: ScheduleTimes::default(),
            distance_meters: None,
        };
        let annotated = place.with_distance_from(Coordinate { lat: 21.4225, lng: 39.8262 });
        assert!(place.distance_meters.is_none());
        assert!(annotated.distance_meters.unwrap() > 1_000.0);
    }

    #[test]
    fn test_fallback_reason_json() {
        let reason = FallbackReason::RemoteFailed("timeout".into());
        let r = ResolutionResult::local_fallback(vec![], reason);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["provenance"], "local_fallback");
        assert_eq!(json["fallback_reason"]["kind"], "remote_failed");
        assert_eq!(json["fallback_reason"]["detail"], "timeout");
        assert!(r.is_degraded());
    }
}
