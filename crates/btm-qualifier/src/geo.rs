//! Great-circle distance helpers.

use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_MILES: f64 = 3959.0;
pub const METERS_PER_MILE: f64 = 1609.34;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn distance_miles(&self, other: &Coordinates) -> f64 {
        haversine_miles(*self, *other)
    }
}

/// Haversine distance in statute miles.
pub fn haversine_miles(from: Coordinates, to: Coordinates) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let dlat = (to.lat - from.lat).to_radians();
    let dlng = (to.lng - from.lng).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_MILES * c
}

pub fn miles_to_meters(miles: f64) -> f64 {
    miles * METERS_PER_MILE
}
