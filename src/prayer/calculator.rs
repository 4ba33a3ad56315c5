//! The prayer-time calculator.
//!
//! Each event is placed in closed form from the solar transit and the hour
//! angle of a target sun altitude. Events whose altitude is never reached
//! are reported as missing rather than approximated.

use super::solar::{self, HORIZON_ALTITUDE};
use super::types::{AsrJuristic, CalculationMethod, IshaRule, PrayerTimes};
use crate::geo::Coordinate;
use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Computes the five daily prayer times for a place and a calendar date.
/// Pure and synchronous.
pub trait PrayerTimeCalculator: Send + Sync {
    fn times(&self, coordinate: Coordinate, date: NaiveDate) -> PrayerTimes;
}

/// Angle-based calculator on top of the solar ephemeris.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolarCalculator {
    pub method: CalculationMethod,
    pub asr: AsrJuristic,
}

impl SolarCalculator {
    pub fn new(method: CalculationMethod, asr: AsrJuristic) -> Self {
        Self { method, asr }
    }
}

/// `minutes` after 00:00 UTC of `date`; None if the instant is not representable.
fn at_minutes(date: NaiveDate, minutes: f64) -> Option<DateTime<Utc>> {
    let midnight = date.and_hms_opt(0, 0, 0)?.and_utc();
    midnight.checked_add_signed(Duration::try_seconds((minutes * 60.0).round() as i64)?)
}

impl PrayerTimeCalculator for SolarCalculator {
    fn times(&self, coordinate: Coordinate, date: NaiveDate) -> PrayerTimes {
        let Coordinate { lat, lng } = coordinate;
        let sun = solar::sun_params_at_noon(date, lng);
        let noon = solar::transit_minutes(lng, &sun);

        let before_noon = |altitude: f64| {
            solar::hour_angle(lat, sun.declination, altitude).map(|h| noon - 4.0 * h)
        };
        let after_noon = |altitude: f64| {
            solar::hour_angle(lat, sun.declination, altitude).map(|h| noon + 4.0 * h)
        };

        let fajr = before_noon(-self.method.fajr_angle());
        let asr = solar::asr_altitude(lat, sun.declination, self.asr.shadow_factor())
            .and_then(after_noon);
        let maghrib = after_noon(HORIZON_ALTITUDE);
        let isha = match self.method.isha_rule() {
            IshaRule::Angle(angle) => after_noon(-angle),
            IshaRule::MinutesAfterMaghrib(m) => maghrib.map(|t| t + m as f64),
        };

        PrayerTimes {
            date,
            coordinate,
            method: self.method,
            asr_juristic: self.asr,
            fajr: fajr.and_then(|m| at_minutes(date, m)),
            dhuhr: at_minutes(date, noon),
            asr: asr.and_then(|m| at_minutes(date, m)),
            maghrib: maghrib.and_then(|m| at_minutes(date, m)),
            isha: isha.and_then(|m| at_minutes(date, m)),
        }
    }
}
