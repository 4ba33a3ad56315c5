//! Prayer-time value types.

use crate::geo::Coordinate;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Shown in place of a time when the event does not occur that day.
pub const MISSING_TIME: &str = "--:--";

/// The five daily prayers, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Prayer {
    Fajr,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl Prayer {
    pub const ALL: [Prayer; 5] = [
        Prayer::Fajr,
        Prayer::Dhuhr,
        Prayer::Asr,
        Prayer::Maghrib,
        Prayer::Isha,
    ];
}

impl fmt::Display for Prayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fajr => write!(f, "Fajr"),
            Self::Dhuhr => write!(f, "Dhuhr"),
            Self::Asr => write!(f, "Asr"),
            Self::Maghrib => write!(f, "Maghrib"),
            Self::Isha => write!(f, "Isha"),
        }
    }
}

/// Display strings for the five daily slots, as shown next to a place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleTimes {
    pub fajr: String,
    pub dhuhr: String,
    pub asr: String,
    pub maghrib: String,
    pub isha: String,
}

impl ScheduleTimes {
    pub fn new(fajr: &str, dhuhr: &str, asr: &str, maghrib: &str, isha: &str) -> Self {
        Self {
            fajr: fajr.to_string(),
            dhuhr: dhuhr.to_string(),
            asr: asr.to_string(),
            maghrib: maghrib.to_string(),
            isha: isha.to_string(),
        }
    }

    pub fn get(&self, prayer: Prayer) -> &str {
        match prayer {
            Prayer::Fajr => &self.fajr,
            Prayer::Dhuhr => &self.dhuhr,
            Prayer::Asr => &self.asr,
            Prayer::Maghrib => &self.maghrib,
            Prayer::Isha => &self.isha,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Prayer, &str)> {
        Prayer::ALL.into_iter().map(move |p| (p, self.get(p)))
    }
}

impl Default for ScheduleTimes {
    fn default() -> Self {
        Self::new(MISSING_TIME, MISSING_TIME, MISSING_TIME, MISSING_TIME, MISSING_TIME)
    }
}

/// How Isha is derived for a method.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IshaRule {
    /// Sun depression angle below the horizon, in degrees.
    Angle(f64),
    /// Fixed interval after Maghrib.
    MinutesAfterMaghrib(i64),
}

/// Twilight conventions for Fajr and Isha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationMethod {
    #[default]
    MuslimWorldLeague,
    UmmAlQura,
    Egyptian,
    Isna,
    Karachi,
}

impl CalculationMethod {
    /// Sun depression angle for Fajr, in degrees.
    pub fn fajr_angle(self) -> f64 {
        match self {
            Self::MuslimWorldLeague => 18.0,
            Self::UmmAlQura => 18.5,
            Self::Egyptian => 19.5,
            Self::Isna => 15.0,
            Self::Karachi => 18.0,
        }
    }

    pub fn isha_rule(self) -> IshaRule {
        match self {
            Self::MuslimWorldLeague => IshaRule::Angle(17.0),
            Self::UmmAlQura => IshaRule::MinutesAfterMaghrib(90),
            Self::Egyptian => IshaRule::Angle(17.5),
            Self::Isna => IshaRule::Angle(15.0),
            Self::Karachi => IshaRule::Angle(18.0),
        }
    }
}

impl fmt::Display for CalculationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MuslimWorldLeague => write!(f, "MuslimWorldLeague"),
            Self::UmmAlQura => write!(f, "UmmAlQura"),
            Self::Egyptian => write!(f, "Egyptian"),
            Self::Isna => write!(f, "ISNA"),
            Self::Karachi => write!(f, "Karachi"),
        }
    }
}

impl FromStr for CalculationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "mwl" | "muslimworldleague" => Ok(Self::MuslimWorldLeague),
            "ummalqura" | "makkah" => Ok(Self::UmmAlQura),
            "egyptian" | "egypt" => Ok(Self::Egyptian),
            "isna" | "northamerica" => Ok(Self::Isna),
            "karachi" => Ok(Self::Karachi),
            _ => Err(format!(
                "Unknown method '{}'. Use mwl, umm-al-qura, egyptian, isna or karachi.",
                s
            )),
        }
    }
}

/// Shadow-length convention for Asr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AsrJuristic {
    /// Shadow equals object length plus noon shadow.
    #[default]
    Standard,
    /// Shadow twice the object length plus noon shadow.
    Hanafi,
}

impl AsrJuristic {
    pub fn shadow_factor(self) -> f64 {
        match self {
            Self::Standard => 1.0,
            Self::Hanafi => 2.0,
        }
    }
}

impl fmt::Display for AsrJuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "Standard"),
            Self::Hanafi => write!(f, "Hanafi"),
        }
    }
}

impl FromStr for AsrJuristic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" | "shafi" => Ok(Self::Standard),
            "hanafi" => Ok(Self::Hanafi),
            _ => Err(format!("Unknown Asr convention '{}'. Use 'standard' or 'hanafi'.", s)),
        }
    }
}

/// Current prayer period and the next one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentPrayer {
    /// None before Fajr when yesterday's Isha is unknown.
    pub current: Option<Prayer>,
    pub next: Prayer,
    pub remaining_minutes: i64,
}

/// Computed prayer instants for one day at one place. `None` means the event
/// does not happen (high-latitude summer or winter).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrayerTimes {
    pub date: NaiveDate,
    pub coordinate: Coordinate,
    pub method: CalculationMethod,
    pub asr_juristic: AsrJuristic,
    pub fajr: Option<DateTime<Utc>>,
    pub dhuhr: Option<DateTime<Utc>>,
    pub asr: Option<DateTime<Utc>>,
    pub maghrib: Option<DateTime<Utc>>,
    pub isha: Option<DateTime<Utc>>,
}

impl PrayerTimes {
    pub fn get(&self, prayer: Prayer) -> Option<DateTime<Utc>> {
        match prayer {
            Prayer::Fajr => self.fajr,
            Prayer::Dhuhr => self.dhuhr,
            Prayer::Asr => self.asr,
            Prayer::Maghrib => self.maghrib,
            Prayer::Isha => self.isha,
        }
    }

    /// Local "HH:MM" strings for display.
    pub fn in_timezone(&self, tz: Tz) -> ScheduleTimes {
        let fmt = |t: Option<DateTime<Utc>>| {
            t.map(|t| t.with_timezone(&tz).format("%H:%M").to_string())
                .unwrap_or_else(|| MISSING_TIME.to_string())
        };
        ScheduleTimes {
            fajr: fmt(self.fajr),
            dhuhr: fmt(self.dhuhr),
            asr: fmt(self.asr),
            maghrib: fmt(self.maghrib),
            isha: fmt(self.isha),
        }
    }

    /// Which prayer period `now` falls in, and how long until the next one.
    ///
    /// After the last event of the day, the next prayer is the first timed
    /// event shifted by one day.
    pub fn current_and_next(&self, now: DateTime<Utc>) -> Option<CurrentPrayer> {
        let timed: Vec<(Prayer, DateTime<Utc>)> = Prayer::ALL
            .iter()
            .filter_map(|p| self.get(*p).map(|t| (*p, t)))
            .collect();

        let (first, last) = (*timed.first()?, *timed.last()?);

        let (current, next, at) = match timed.iter().position(|(_, t)| now < *t) {
            Some(0) => (None, first.0, first.1),
            Some(i) => (Some(timed[i - 1].0), timed[i].0, timed[i].1),
            None => (Some(last.0), first.0, first.1.checked_add_signed(Duration::days(1))?),
        };

        let remaining = (at - now).num_seconds();
        Some(CurrentPrayer {
            current,
            next,
            remaining_minutes: ((remaining + 59) / 60).max(0),
        })
    }
}
