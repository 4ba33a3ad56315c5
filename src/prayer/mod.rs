//! Prayer-time calculation.

pub mod calculator;
pub mod solar;
pub mod types;

pub use calculator::{PrayerTimeCalculator, SolarCalculator};
pub use solar::{check_date, UnsupportedDate};
pub use types::{
    AsrJuristic, CalculationMethod, CurrentPrayer, Prayer, PrayerTimes, ScheduleTimes, MISSING_TIME,
};
