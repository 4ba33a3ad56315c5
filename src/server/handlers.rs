use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::geo::Coordinate;
use crate::places::{NewPlace, RemoteError, ResolutionResult};
use crate::prayer::{
    check_date, AsrJuristic, CalculationMethod, CurrentPrayer, PrayerTimeCalculator, ScheduleTimes,
};
use crate::session::SessionSnapshot;

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

#[derive(Debug)]
pub struct ApiError(pub StatusCode, pub String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

impl From<RemoteError> for ApiError {
    fn from(e: RemoteError) -> Self {
        let status = match &e {
            RemoteError::InvalidPlace(_) => StatusCode::BAD_REQUEST,
            RemoteError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            RemoteError::Network(_)
            | RemoteError::Status { .. }
            | RemoteError::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
        };
        api_error(status, e.to_string())
    }
}

// ─── Shared query parsing ────────────────────────────────────────

/// Explicit coordinates if both are given, otherwise the session location.
async fn coordinate_or_session(
    state: &AppState,
    lat: Option<f64>,
    lon: Option<f64>,
) -> Result<Coordinate, ApiError> {
    match (lat, lon) {
        (Some(lat), Some(lon)) => {
            Coordinate::new(lat, lon).map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))
        }
        (None, None) => Ok(state.session.location().resolve().await.coordinate),
        _ => Err(api_error(StatusCode::BAD_REQUEST, "Provide both 'lat' and 'lon', or neither")),
    }
}

fn parse_tz(tz: Option<&str>, default: Tz) -> Result<Tz, ApiError> {
    match tz {
        Some(name) => name.parse().map_err(|_| {
            api_error(StatusCode::BAD_REQUEST, format!("Unknown timezone '{}'", name))
        }),
        None => Ok(default),
    }
}

fn parse_date(date: Option<&str>) -> Result<NaiveDate, ApiError> {
    let date = match date {
        Some(d) => NaiveDate::parse_from_str(d, "%Y-%m-%d").map_err(|e| {
            api_error(StatusCode::BAD_REQUEST, format!("Invalid date '{}': {}", d, e))
        })?,
        None => Utc::now().date_naive(),
    };
    check_date(date).map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))
}

// ─── GET /api/health ─────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend_configured: bool,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        backend_configured: state.resolver.is_configured(),
    })
}

// ─── GET /api/nearby ─────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub struct NearbyQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

pub async fn nearby(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NearbyQuery>,
) -> Result<Json<ResolutionResult>, ApiError> {
    let start = Instant::now();
    let coordinate = coordinate_or_session(&state, params.lat, params.lon).await?;

    let result = state.resolver.resolve(coordinate).await;

    info!(
        lat = coordinate.lat,
        lng = coordinate.lng,
        provenance = %result.provenance,
        count = result.places.len(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "GET /api/nearby"
    );
    Ok(Json(result))
}

// ─── GET /api/times ──────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub struct TimesQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub date: Option<String>,
    pub tz: Option<String>,
    pub method: Option<String>,
    pub asr: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TimesResponse {
    pub date: String,
    pub coordinate: Coordinate,
    pub timezone: String,
    pub method: CalculationMethod,
    pub asr: AsrJuristic,
    pub times: ScheduleTimes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<CurrentPrayer>,
}

pub async fn prayer_times(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TimesQuery>,
) -> Result<Json<TimesResponse>, ApiError> {
    let start = Instant::now();
    let coordinate = coordinate_or_session(&state, params.lat, params.lon).await?;
    let tz = parse_tz(params.tz.as_deref(), state.tz)?;
    let date = parse_date(params.date.as_deref())?;

    let mut calculator = state.calculator;
    if let Some(m) = params.method.as_deref() {
        calculator.method = m
            .parse::<CalculationMethod>()
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;
    }
    if let Some(a) = params.asr.as_deref() {
        calculator.asr = a
            .parse::<AsrJuristic>()
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;
    }

    let times = calculator.times(coordinate, date);
    let now = Utc::now();
    let current = if now.with_timezone(&tz).date_naive() == date {
        times.current_and_next(now)
    } else {
        None
    };

    info!(
        lat = coordinate.lat,
        lng = coordinate.lng,
        %date,
        method = %calculator.method,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "GET /api/times"
    );

    Ok(Json(TimesResponse {
        date: date.to_string(),
        coordinate,
        timezone: tz.name().to_string(),
        method: calculator.method,
        asr: calculator.asr,
        times: times.in_timezone(tz),
        current,
    }))
}

// ─── GET /api/session ────────────────────────────────────────────

pub async fn session(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    let now = Utc::now();
    let today = now.with_timezone(&state.tz).date_naive();
    Json(state.session.start(today, now).await)
}

// ─── POST /api/places ────────────────────────────────────────────

pub async fn submit_place(
    State(state): State<Arc<AppState>>,
    Json(form): Json<NewPlace>,
) -> Result<(StatusCode, Json<NewPlace>), ApiError> {
    let stored = state.resolver.submit(&form).await?;
    info!(name = %stored.name, "POST /api/places");
    Ok((StatusCode::CREATED, Json(stored)))
}
