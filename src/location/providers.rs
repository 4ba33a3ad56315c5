//! Location providers: IP geolocation, manual coordinates, and a provider
//! that always refuses (offline / no capability).

use super::types::LocationError;
use crate::geo::Coordinate;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

const IP_API_URL: &str = "https://ipapi.co/json/";
const USER_AGENT: &str = concat!("MasjidLocator/", env!("CARGO_PKG_VERSION"));

/// A one-shot source of the device position.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Short label used in logs and in `LocationFix::note`.
    fn name(&self) -> &str;

    /// Ask for the current position once. No streaming, no retries.
    async fn current_position(&self) -> Result<Coordinate, LocationError>;
}

// ─── IP-based geolocation ───────────────────────────────────────

#[derive(Deserialize)]
struct IpApiResult {
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default)]
    error: bool,
    #[serde(default)]
    reason: Option<String>,
}

/// Approximate position from the public IP address.
///
/// No explicit timeout is set; the HTTP agent's defaults apply.
pub struct IpLocationProvider {
    url: String,
}

impl IpLocationProvider {
    pub fn new() -> Self {
        Self { url: IP_API_URL.to_string() }
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Default for IpLocationProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn coordinate_from_ip(r: IpApiResult) -> Result<Coordinate, LocationError> {
    if r.error {
        return Err(LocationError::Denied(r.reason.unwrap_or_else(|| "lookup refused".into())));
    }
    let lat = r.latitude.ok_or_else(|| LocationError::InvalidResponse("no latitude".into()))?;
    let lng = r.longitude.ok_or_else(|| LocationError::InvalidResponse("no longitude".into()))?;
    Coordinate::new(lat, lng).map_err(|e| LocationError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl LocationProvider for IpLocationProvider {
    fn name(&self) -> &str {
        "ip"
    }

    async fn current_position(&self) -> Result<Coordinate, LocationError> {
        let url = self.url.clone();
        debug!(%url, "requesting IP geolocation");
        let result = tokio::task::spawn_blocking(move || -> Result<IpApiResult, LocationError> {
            let response = ureq::get(&url)
                .set("User-Agent", USER_AGENT)
                .call()
                .map_err(|e| LocationError::Network(e.to_string()))?;
            response
                .into_json()
                .map_err(|e| LocationError::InvalidResponse(e.to_string()))
        })
        .await
        .map_err(|e| LocationError::Network(e.to_string()))??;

        coordinate_from_ip(result)
    }
}

// ─── Manual coordinates ─────────────────────────────────────────

/// Always reports the same coordinate (`--lat/--lon`).
pub struct FixedLocationProvider {
    coordinate: Coordinate,
}

impl FixedLocationProvider {
    pub fn new(coordinate: Coordinate) -> Self {
        Self { coordinate }
    }
}

#[async_trait]
impl LocationProvider for FixedLocationProvider {
    fn name(&self) -> &str {
        "manual"
    }

    async fn current_position(&self) -> Result<Coordinate, LocationError> {
        Ok(self.coordinate)
    }
}

// ─── No capability ──────────────────────────────────────────────

/// Stands in for a platform that refuses location access.
pub struct UnavailableProvider;

#[async_trait]
impl LocationProvider for UnavailableProvider {
    fn name(&self) -> &str {
        "none"
    }

    async fn current_position(&self) -> Result<Coordinate, LocationError> {
        Err(LocationError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;

    fn parse(json: &str) -> Result<Coordinate, LocationError> {
        coordinate_from_ip(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_ip_response_ok() {
        let c = parse(r#"{"latitude": 59.3293, "longitude": 18.0686, "city": "Stockholm"}"#)
            .unwrap();
        assert!((c.lat - 59.3293).abs() < 1e-9);
        assert!((c.lng - 18.0686).abs() < 1e-9);
    }

    #[test]
    fn test_ip_response_missing_field() {
        let err = parse(r#"{"latitude": 59.3}"#).unwrap_err();
        assert!(matches!(err, LocationError::InvalidResponse(_)));
    }

    #[test]
    fn test_ip_response_refused() {
        let err = parse(r#"{"error": true, "reason": "RateLimited"}"#).unwrap_err();
        assert_eq!(err, LocationError::Denied("RateLimited".into()));
    }

    #[test]
    fn test_ip_response_out_of_range() {
        let err = parse(r#"{"latitude": 123.0, "longitude": 0.0}"#).unwrap_err();
        assert!(matches!(err, LocationError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_fixed_provider() {
        let c = Coordinate::new(24.4686, 39.6142).unwrap();
        assert_eq!(FixedLocationProvider::new(c).current_position().await, Ok(c));
    }

    #[tokio::test]
    async fn test_unavailable_provider() {
        assert_eq!(UnavailableProvider.current_position().await, Err(LocationError::Unavailable));
    }

    /// Serve `app` on an ephemeral local port and return its base URL.
    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{}", addr)
    }

    fn json_route(body: serde_json::Value) -> Router {
        Router::new().route(
            "/json/",
            get(move || {
                let body = body.clone();
                async move { axum::Json(body) }
            }),
        )
    }

    #[tokio::test]
    async fn test_ip_provider_over_http() {
        let base = serve(json_route(serde_json::json!({
            "ip": "203.0.113.7",
            "latitude": 24.4672,
            "longitude": 39.6112
        })))
        .await;

        let provider = IpLocationProvider::with_url(format!("{}/json/", base));
        let c = provider.current_position().await.unwrap();
        assert_eq!(c, Coordinate::new(24.4672, 39.6112).unwrap());
    }

    #[tokio::test]
    async fn test_ip_provider_refusal_over_http() {
        let base = serve(json_route(serde_json::json!({
            "error": true,
            "reason": "Reserved IP Address"
        })))
        .await;

        let provider = IpLocationProvider::with_url(format!("{}/json/", base));
        assert_eq!(
            provider.current_position().await,
            Err(LocationError::Denied("Reserved IP Address".into()))
        );
    }

    #[tokio::test]
    async fn test_ip_provider_http_error_status() {
        let app = Router::new().route(
            "/json/",
            get(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        );
        let base = serve(app).await;

        let provider = IpLocationProvider::with_url(format!("{}/json/", base));
        let err = provider.current_position().await.unwrap_err();
        assert!(matches!(err, LocationError::Network(_)));
    }
}
