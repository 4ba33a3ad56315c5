//! Core types for the location subsystem.

use crate::geo::{format_coords, Coordinate};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Where the session's coordinate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationOrigin {
    /// Reported by a location provider (IP lookup, manual input).
    Device,
    /// Provider denied or failed; the built-in default is in use.
    Default,
}

impl fmt::Display for LocationOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device => write!(f, "Device"),
            Self::Default => write!(f, "Default"),
        }
    }
}

/// The resolved session location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub coordinate: Coordinate,
    pub origin: LocationOrigin,
    /// Provider label or the reason the default was used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl LocationFix {
    pub fn display_line(&self) -> String {
        match &self.note {
            Some(note) => format!("{} ({}: {})", format_coords(self.coordinate), self.origin, note),
            None => format!("{} ({})", format_coords(self.coordinate), self.origin),
        }
    }
}

/// Location resolution errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationError {
    #[error("location permission denied: {0}")]
    Denied(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid location response: {0}")]
    InvalidResponse(String),
    #[error("no location capability available")]
    Unavailable,
}
