use crate::places::NearbyPlacesResolver;
use crate::prayer::SolarCalculator;
use crate::session::Session;
use chrono_tz::Tz;
use std::sync::Arc;

pub struct AppState {
    pub resolver: Arc<NearbyPlacesResolver>,
    /// Default method and Asr convention; requests may override either.
    pub calculator: SolarCalculator,
    pub tz: Tz,
    pub session: Session,
}
