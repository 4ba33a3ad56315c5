//! Session bootstrap: locate once, resolve nearby places once, compute the
//! day's prayer schedule for the same coordinate.

use crate::location::{LocationFix, LocationProvider, LocationSource};
use crate::places::{NearbyPlacesResolver, ResolutionResult};
use crate::prayer::{CurrentPrayer, PrayerTimeCalculator, PrayerTimes, ScheduleTimes};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Everything the presentation layer renders on first load.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub location: LocationFix,
    pub nearby: ResolutionResult,
    pub timezone: String,
    pub prayer_times: ScheduleTimes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<CurrentPrayer>,
    /// Mirrors `nearby.is_degraded()` for the demo-mode banner.
    pub degraded: bool,
}

pub struct Session {
    location: LocationSource,
    resolver: Arc<NearbyPlacesResolver>,
    calculator: Arc<dyn PrayerTimeCalculator>,
    tz: Tz,
    bootstrap: OnceCell<(LocationFix, ResolutionResult)>,
}

impl Session {
    pub fn new(
        location: LocationSource,
        resolver: Arc<NearbyPlacesResolver>,
        calculator: Arc<dyn PrayerTimeCalculator>,
        tz: Tz,
    ) -> Self {
        Self { location, resolver, calculator, tz, bootstrap: OnceCell::new() }
    }

    /// Convenience for the common wiring: provider plus default coordinate.
    pub fn with_provider(
        provider: Arc<dyn LocationProvider>,
        default: crate::geo::Coordinate,
        resolver: Arc<NearbyPlacesResolver>,
        calculator: Arc<dyn PrayerTimeCalculator>,
        tz: Tz,
    ) -> Self {
        Self::new(LocationSource::new(provider, default), resolver, calculator, tz)
    }

    /// Snapshot for `date` as seen at `now`. The location request and the
    /// nearby resolution happen on the first call only; the schedule and the
    /// current prayer are computed on every call.
    pub async fn start(&self, date: NaiveDate, now: DateTime<Utc>) -> SessionSnapshot {
        let (fix, nearby) = self.bootstrap().await;
        let times = self.calculator.times(fix.coordinate, date);
        self.build_snapshot(fix.clone(), nearby.clone(), &times, now)
    }

    async fn bootstrap(&self) -> &(LocationFix, ResolutionResult) {
        self.bootstrap
            .get_or_init(|| async {
                let fix = self.location.resolve().await.clone();
                let nearby = self.resolver.resolve(fix.coordinate).await;
                (fix, nearby)
            })
            .await
    }

    fn build_snapshot(
        &self,
        location: LocationFix,
        nearby: ResolutionResult,
        times: &PrayerTimes,
        now: DateTime<Utc>,
    ) -> SessionSnapshot {
        let current = if times.date == now.with_timezone(&self.tz).date_naive() {
            times.current_and_next(now)
        } else {
            None
        };
        SessionSnapshot {
            degraded: nearby.is_degraded(),
            location,
            nearby,
            timezone: self.tz.name().to_string(),
            prayer_times: times.in_timezone(self.tz),
            current,
        }
    }

    pub fn location(&self) -> &LocationSource {
        &self.location
    }
}
