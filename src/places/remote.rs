//! Remote place directory (PostgREST-style backend).
//!
//! Nearby:  POST {url}/rest/v1/rpc/nearby_places  {"lat": .., "long": ..}
//! Submit:  POST {url}/rest/v1/places              row JSON

use super::types::{NewPlace, Place, PlaceValidationError};
use crate::geo::Coordinate;
use crate::prayer::{ScheduleTimes, MISSING_TIME};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const USER_AGENT: &str = concat!("MasjidLocator/", env!("CARGO_PKG_VERSION"));

/// Connection settings for the backend. Present only when both the URL and
/// the key were supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub url: String,
    pub api_key: String,
    /// Per-request timeout. None leaves the HTTP agent's defaults in place.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl RemoteConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self { url: url.into(), api_key: api_key.into(), timeout_secs: None }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.url.trim_end_matches('/'), path)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RemoteError {
    #[error("backend not configured")]
    NotConfigured,
    #[error("network error: {0}")]
    Network(String),
    #[error("backend returned HTTP {code}: {body}")]
    Status { code: u16, body: String },
    #[error("invalid backend response: {0}")]
    InvalidResponse(String),
    #[error("invalid place: {0}")]
    InvalidPlace(#[from] PlaceValidationError),
}

/// The remote data collaborator.
#[async_trait]
pub trait PlaceDirectory: Send + Sync {
    /// Places near `coordinate`, with `distance_meters` filled by the backend.
    async fn nearby(&self, coordinate: Coordinate) -> Result<Vec<Place>, RemoteError>;

    /// Insert a new, already validated, place.
    async fn submit(&self, place: &NewPlace) -> Result<(), RemoteError>;
}

// ─── Wire types ─────────────────────────────────────────────────

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum RecordId {
    Int(i64),
    Text(String),
}

#[derive(Deserialize, Debug)]
struct PlaceRecord {
    id: RecordId,
    name: String,
    lat: f64,
    #[serde(alias = "lng")]
    long: f64,
    #[serde(default)]
    address: Option<String>,
    #[serde(default, alias = "distance_meters")]
    dist_meters: Option<f64>,
    #[serde(default)]
    fajr: Option<String>,
    #[serde(default)]
    dhuhr: Option<String>,
    #[serde(default)]
    asr: Option<String>,
    #[serde(default)]
    maghrib: Option<String>,
    #[serde(default)]
    isha: Option<String>,
}

impl PlaceRecord {
    fn into_place(self) -> Result<Place, RemoteError> {
        let coordinate = Coordinate::new(self.lat, self.long)
            .map_err(|e| RemoteError::InvalidResponse(format!("place '{}': {}", self.name, e)))?;
        let slot = |s: Option<String>| s.unwrap_or_else(|| MISSING_TIME.to_string());
        Ok(Place {
            id: match self.id {
                RecordId::Int(n) => n.to_string(),
                RecordId::Text(s) => s,
            },
            name: self.name,
            coordinate,
            address: self.address,
            schedule_times: ScheduleTimes {
                fajr: slot(self.fajr),
                dhuhr: slot(self.dhuhr),
                asr: slot(self.asr),
                maghrib: slot(self.maghrib),
                isha: slot(self.isha),
            },
            distance_meters: self.dist_meters.filter(|d| d.is_finite() && *d >= 0.0),
        })
    }
}

#[derive(Serialize)]
struct NearbyRequest {
    lat: f64,
    long: f64,
}

#[derive(Serialize)]
struct InsertRow<'a> {
    name: &'a str,
    lat: f64,
    long: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<&'a str>,
    fajr: &'a str,
    dhuhr: &'a str,
    asr: &'a str,
    maghrib: &'a str,
    isha: &'a str,
}

/// Decode a nearby response body. Any malformed record fails the whole call.
fn parse_nearby(body: serde_json::Value) -> Result<Vec<Place>, RemoteError> {
    let records: Vec<PlaceRecord> =
        serde_json::from_value(body).map_err(|e| RemoteError::InvalidResponse(e.to_string()))?;
    records.into_iter().map(PlaceRecord::into_place).collect()
}

fn map_ureq_error(e: ureq::Error) -> RemoteError {
    match e {
        ureq::Error::Status(code, response) => RemoteError::Status {
            code,
            body: response.into_string().unwrap_or_default(),
        },
        ureq::Error::Transport(t) => RemoteError::Network(t.to_string()),
    }
}

// ─── HTTP implementation ────────────────────────────────────────

pub struct RestDirectory {
    config: RemoteConfig,
}

impl RestDirectory {
    pub fn new(config: RemoteConfig) -> Self {
        Self { config }
    }

    fn post(config: &RemoteConfig, path: &str) -> ureq::Request {
        let mut request = ureq::post(&config.endpoint(path))
            .set("User-Agent", USER_AGENT)
            .set("apikey", &config.api_key)
            .set("Authorization", &format!("Bearer {}", config.api_key));
        if let Some(secs) = config.timeout_secs {
            request = request.timeout(Duration::from_secs(secs));
        }
        request
    }
}

#[async_trait]
impl PlaceDirectory for RestDirectory {
    async fn nearby(&self, coordinate: Coordinate) -> Result<Vec<Place>, RemoteError> {
        let config = self.config.clone();
        debug!(
            url = %config.url,
            lat = coordinate.lat,
            lng = coordinate.lng,
            "querying nearby places"
        );

        let body = tokio::task::spawn_blocking(move || -> Result<serde_json::Value, RemoteError> {
            let response = Self::post(&config, "rpc/nearby_places")
                .send_json(NearbyRequest { lat: coordinate.lat, long: coordinate.lng })
                .map_err(map_ureq_error)?;
            response
                .into_json()
                .map_err(|e| RemoteError::InvalidResponse(e.to_string()))
        })
        .await
        .map_err(|e| RemoteError::Network(e.to_string()))??;

        parse_nearby(body)
    }

    async fn submit(&self, place: &NewPlace) -> Result<(), RemoteError> {
        let config = self.config.clone();
        let place = place.clone();
        debug!(url = %config.url, name = %place.name, "submitting place");

        tokio::task::spawn_blocking(move || -> Result<(), RemoteError> {
            let s = &place.schedule_times;
            let row = InsertRow {
                name: &place.name,
                lat: place.coordinate.lat,
                long: place.coordinate.lng,
                address: place.address.as_deref(),
                fajr: &s.fajr,
                dhuhr: &s.dhuhr,
                asr: &s.asr,
                maghrib: &s.maghrib,
                isha: &s.isha,
            };
            Self::post(&config, "places")
                .set("Prefer", "return=minimal")
                .send_json(row)
                .map_err(map_ureq_error)?;
            Ok(())
        })
        .await
        .map_err(|e| RemoteError::Network(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_nearby_records() {
        let body = json!([
            {"id": 7, "name": "Masjid al-Jinn", "lat": 21.43, "long": 39.835,
             "dist_meters": 1235.0, "fajr": "05:35", "dhuhr": "12:33", "asr": "15:51",
             "maghrib": "18:17", "isha": "19:47"},
            {"id": "b3c1", "name": "Masjid Bilal", "lat": 21.41, "lng": 39.82}
        ]);
        let places = parse_nearby(body).unwrap();
        assert_eq!(places.len(), 2);
        assert_eq!(places[0].id, "7");
        assert_eq!(places[0].distance_meters, Some(1235.0));
        assert_eq!(places[0].schedule_times.isha, "19:47");
        assert_eq!(places[1].id, "b3c1");
        assert_eq!(places[1].distance_meters, None);
        assert_eq!(places[1].schedule_times.fajr, MISSING_TIME);
    }

    #[test]
    fn test_parse_nearby_empty() {
        assert!(parse_nearby(json!([])).unwrap().is_empty());
    }

    #[test]
    fn test_parse_nearby_malformed() {
        let err = parse_nearby(json!({"message": "permission denied"})).unwrap_err();
        assert!(matches!(err, RemoteError::InvalidResponse(_)));

        let body = json!([{"id": 1, "name": "X", "lat": 200.0, "long": 0.0}]);
        let err = parse_nearby(body).unwrap_err();
        assert!(err.to_string().contains("place 'X'"));
    }

    #[test]
    fn test_endpoint_trims_slash() {
        let cfg = RemoteConfig::new("https://db.example.org/", "k");
        assert_eq!(cfg.endpoint("places"), "https://db.example.org/rest/v1/places");
    }

    #[test]
    fn test_insert_row_shape() {
        let row = InsertRow {
            name: "Masjid Quba",
            lat: 24.4393,
            long: 39.6173,
            address: None,
            fajr: "05:20",
            dhuhr: "12:25",
            asr: "15:45",
            maghrib: "18:10",
            isha: "19:40",
        };
        let v = serde_json::to_value(&row).unwrap();
        assert_eq!(v["long"], 39.6173);
        assert!(v.get("address").is_none());
    }
}
