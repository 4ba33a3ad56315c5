//! Low-precision solar ephemeris (NOAA formulation).
//!
//! Good to about a minute of time for dates within ±50 years of J2000,
//! which is the resolution prayer schedules are published at. Dates outside
//! `SUPPORTED_YEARS` are refused at the input boundary.

use chrono::{Datelike, NaiveDate};
use std::ops::RangeInclusive;
use thiserror::Error;

/// Years accepted from callers. Error stays within a few minutes here.
pub const SUPPORTED_YEARS: RangeInclusive<i32> = 1900..=2100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("date {0} is outside the supported range (years 1900 to 2100)")]
pub struct UnsupportedDate(pub NaiveDate);

/// Pass `date` through if the ephemeris covers it.
pub fn check_date(date: NaiveDate) -> Result<NaiveDate, UnsupportedDate> {
    if SUPPORTED_YEARS.contains(&date.year()) {
        Ok(date)
    } else {
        Err(UnsupportedDate(date))
    }
}

const J2000: f64 = 2451545.0;
/// Julian Day of 0001-01-01T00:00 UTC minus one day, for `num_days_from_ce`.
const CE_EPOCH_JD: f64 = 1721424.5;

/// Sun altitude at apparent sunrise/sunset: refraction plus semi-diameter.
pub const HORIZON_ALTITUDE: f64 = -0.833;

#[derive(Debug, Clone, Copy)]
pub struct SunParams {
    /// Declination in degrees.
    pub declination: f64,
    /// Equation of time in minutes.
    pub equation_of_time: f64,
}

/// Julian Day at 00:00 UTC of `date`.
pub fn julian_day(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64 + CE_EPOCH_JD
}

fn normalize_degrees(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

/// Declination and equation of time at Julian Day `jd`.
pub fn sun_params(jd: f64) -> SunParams {
    let t = (jd - J2000) / 36525.0;

    let mean_lon = normalize_degrees(280.46646 + t * (36000.76983 + t * 0.0003032));
    let mean_anom = normalize_degrees(357.52911 + t * (35999.05029 - t * 0.0001537)).to_radians();
    let ecc = 0.016708634 - t * (0.000042037 + t * 0.0000001267);

    let center = mean_anom.sin() * (1.914602 - t * (0.004817 + t * 0.000014))
        + (2.0 * mean_anom).sin() * (0.019993 - t * 0.000101)
        + (3.0 * mean_anom).sin() * 0.000289;

    let omega = (125.04 - 1934.136 * t).to_radians();
    let apparent_lon = (mean_lon + center - 0.00569 - 0.00478 * omega.sin()).to_radians();

    let arcsec = 21.448 - t * (46.815 + t * (0.00059 - t * 0.001813));
    let mean_obliquity = 23.0 + (26.0 + arcsec / 60.0) / 60.0;
    let obliquity = (mean_obliquity + 0.00256 * omega.cos()).to_radians();

    let declination = (obliquity.sin() * apparent_lon.sin()).asin().to_degrees();

    let y = (obliquity / 2.0).tan().powi(2);
    let l0 = mean_lon.to_radians();
    let eot = y * (2.0 * l0).sin() - 2.0 * ecc * mean_anom.sin()
        + 4.0 * ecc * y * mean_anom.sin() * (2.0 * l0).cos()
        - 0.5 * y * y * (4.0 * l0).sin()
        - 1.25 * ecc * ecc * (2.0 * mean_anom).sin();

    SunParams {
        declination,
        equation_of_time: 4.0 * eot.to_degrees(),
    }
}

/// Sun parameters at local solar noon of `date` for longitude `lng`.
pub fn sun_params_at_noon(date: NaiveDate, lng: f64) -> SunParams {
    sun_params(julian_day(date) + 0.5 - lng / 360.0)
}

/// Minutes after 00:00 UTC of solar transit.
pub fn transit_minutes(lng: f64, params: &SunParams) -> f64 {
    720.0 - 4.0 * lng - params.equation_of_time
}

/// Hour angle (degrees) at which the sun sits at `altitude`, or None if the
/// sun never reaches that altitude on this day.
pub fn hour_angle(lat: f64, declination: f64, altitude: f64) -> Option<f64> {
    let (phi, delta) = (lat.to_radians(), declination.to_radians());
    let cos_h = (altitude.to_radians().sin() - phi.sin() * delta.sin()) / (phi.cos() * delta.cos());
    if (-1.0..=1.0).contains(&cos_h) {
        Some(cos_h.acos().to_degrees())
    } else {
        None
    }
}

/// Sun altitude at which an object's shadow is `shadow_factor` times its
/// length plus the noon shadow. None when the sun stays below the horizon
/// at noon.
pub fn asr_altitude(lat: f64, declination: f64, shadow_factor: f64) -> Option<f64> {
    let zenith_at_noon = (lat - declination).abs();
    if zenith_at_noon >= 90.0 {
        return None;
    }
    Some((1.0 / (shadow_factor + zenith_at_noon.to_radians().tan())).atan().to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_date_range() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(check_date(d(2026, 2, 14)), Ok(d(2026, 2, 14)));
        assert!(check_date(d(1900, 1, 1)).is_ok());
        assert!(check_date(d(2100, 12, 31)).is_ok());
        assert_eq!(check_date(d(1899, 12, 31)), Err(UnsupportedDate(d(1899, 12, 31))));
        assert!(check_date(NaiveDate::MIN).is_err());
        assert!(check_date(NaiveDate::MAX).is_err());
    }

    #[test]
    fn test_julian_day_j2000() {
        let d = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        assert_eq!(julian_day(d), 2451544.5);
    }

    #[test]
    fn test_declination_solstices() {
        let june = sun_params(julian_day(NaiveDate::from_ymd_opt(2026, 6, 21).unwrap()) + 0.5);
        let dec = sun_params(julian_day(NaiveDate::from_ymd_opt(2025, 12, 21).unwrap()) + 0.5);
        assert!((june.declination - 23.44).abs() < 0.1);
        assert!((dec.declination + 23.44).abs() < 0.1);
    }

    #[test]
    fn test_equation_of_time_early_november() {
        // Sundial runs ~16 minutes fast in early November.
        let p = sun_params(julian_day(NaiveDate::from_ymd_opt(2026, 11, 3).unwrap()) + 0.5);
        assert!((p.equation_of_time - 16.4).abs() < 0.5);
    }

    #[test]
    fn test_hour_angle_equinox_equator() {
        let h = hour_angle(0.0, 0.0, 0.0).unwrap();
        assert!((h - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_hour_angle_never_reached() {
        // Polar night: sun never reaches the horizon at 78°N in late December.
        assert!(hour_angle(78.2, -23.4, HORIZON_ALTITUDE).is_none());
        assert!(hour_angle(90.0, 10.0, 0.0).is_none());
    }

    #[test]
    fn test_asr_altitude() {
        // Sun overhead at noon: shadow length 1 → 45°.
        let a = asr_altitude(10.0, 10.0, 1.0).unwrap();
        assert!((a - 45.0).abs() < 1e-9);
        assert!(asr_altitude(10.0, 10.0, 2.0).unwrap() < a);
        assert!(asr_altitude(78.2, -23.4, 1.0).is_none());
    }
}
