//! Built-in place list used when the backend is missing or failing.

use super::types::Place;
use crate::geo::Coordinate;
use crate::prayer::ScheduleTimes;

struct StaticPlace {
    id: &'static str,
    name: &'static str,
    lat: f64,
    lng: f64,
    address: &'static str,
    // fajr, dhuhr, asr, maghrib, isha
    times: [&'static str; 5],
}

const STATIC_PLACES: &[StaticPlace] = &[
    StaticPlace {
        id: "local-1", name: "Masjid al-Haram",
        lat: 21.4225, lng: 39.8262, address: "Ajyad, Mecca",
        times: ["05:35", "12:33", "15:51", "18:17", "19:47"],
    },
    StaticPlace {
        id: "local-2", name: "Masjid al-Jinn",
        lat: 21.4300, lng: 39.8350, address: "Al Ma'abdah, Mecca",
        times: ["05:40", "12:40", "16:00", "18:20", "19:50"],
    },
    StaticPlace {
        id: "local-3", name: "Masjid Aisha (Al-Tan'eem)",
        lat: 21.4653, lng: 39.7905, address: "Al Taneem, Mecca",
        times: ["05:40", "12:45", "16:00", "18:20", "20:00"],
    },
    StaticPlace {
        id: "local-4", name: "Masjid al-Khayf",
        lat: 21.4146, lng: 39.8936, address: "Mina",
        times: ["05:35", "12:35", "15:55", "18:17", "19:50"],
    },
    StaticPlace {
        id: "local-5", name: "Masjid al-Mash'ar al-Haram",
        lat: 21.3833, lng: 39.9117, address: "Muzdalifah",
        times: ["05:35", "12:35", "15:55", "18:17", "19:50"],
    },
    StaticPlace {
        id: "local-6", name: "Masjid Nimrah",
        lat: 21.3525, lng: 39.9663, address: "Arafat",
        times: ["05:35", "12:30", "15:50", "18:15", "19:45"],
    },
    StaticPlace {
        id: "local-7", name: "Masjid an-Nabawi",
        lat: 24.4672, lng: 39.6112, address: "Al Haram, Medina",
        times: ["05:40", "12:35", "15:55", "18:20", "19:50"],
    },
    StaticPlace {
        id: "local-8", name: "Masjid Quba",
        lat: 24.4393, lng: 39.6173, address: "Quba, Medina",
        times: ["05:40", "12:40", "16:00", "18:20", "19:55"],
    },
];

fn to_place(p: &StaticPlace) -> Place {
    let [fajr, dhuhr, asr, maghrib, isha] = p.times;
    Place {
        id: p.id.to_string(),
        name: p.name.to_string(),
        coordinate: Coordinate { lat: p.lat, lng: p.lng },
        address: Some(p.address.to_string()),
        schedule_times: ScheduleTimes::new(fajr, dhuhr, asr, maghrib, isha),
        distance_meters: None,
    }
}

/// The built-in dataset, without distances.
pub fn static_places() -> Vec<Place> {
    STATIC_PLACES.iter().map(to_place).collect()
}

/// Annotate every entry with its distance from `origin`, nearest first.
/// Ties keep dataset order.
pub fn annotate(dataset: &[Place], origin: Coordinate) -> Vec<Place> {
    let mut places: Vec<Place> = dataset.iter().map(|p| p.with_distance_from(origin)).collect();
    places.sort_by(|a, b| {
        a.distance_meters
            .partial_cmp(&b.distance_meters)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    places
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::DEFAULT_COORDINATE;

    #[test]
    fn test_dataset_is_valid() {
        let places = static_places();
        assert_eq!(places.len(), STATIC_PLACES.len());
        for p in &places {
            assert!(p.coordinate.validate().is_ok(), "{} has a bad coordinate", p.name);
            assert!(p.distance_meters.is_none());
        }
        let mut ids: Vec<_> = places.iter().map(|p| p.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), places.len());
    }

    #[test]
    fn test_annotate_sorted_nearest_first() {
        let annotated = annotate(&static_places(), DEFAULT_COORDINATE);
        assert_eq!(annotated.len(), STATIC_PLACES.len());
        assert_eq!(annotated[0].name, "Masjid al-Haram");
        assert!(annotated[0].distance_meters.unwrap() < 1e-6);
        assert_eq!(annotated[1].name, "Masjid al-Jinn");
        assert!(annotated.windows(2).all(|w| w[0].distance_meters <= w[1].distance_meters));
    }

    #[test]
    fn test_annotate_from_medina() {
        let medina = Coordinate::new(24.4672, 39.6112).unwrap();
        let annotated = annotate(&static_places(), medina);
        assert_eq!(annotated[0].name, "Masjid an-Nabawi");
        assert_eq!(annotated[1].name, "Masjid Quba");
        // Mecca entries are ~340 km away.
        assert!(annotated[2].distance_meters.unwrap() > 300_000.0);
    }
}
