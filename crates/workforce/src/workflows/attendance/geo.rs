use serde::{Deserialize, Serialize};

use crate::workflows::directory::{Coordinate, LocationZone, ZoneId};

/// Mean Earth radius used for great-circle distances.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine distance in meters between two points given in decimal degrees.
///
/// Any finite input is accepted; out-of-range angles yield a number with no
/// physical meaning.
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    // rounding can push `a` a hair past 1.0 for antipodal points
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

impl Coordinate {
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        distance_meters(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }
}

/// Distance from a coordinate to one configured zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneProximity {
    pub zone_id: ZoneId,
    pub zone_name: String,
    pub distance_meters: f64,
    pub within_radius: bool,
}

impl ZoneProximity {
    fn measure(coordinate: &Coordinate, zone: &LocationZone) -> Self {
        let distance = coordinate.distance_to(&zone.center);
        Self {
            zone_id: zone.id.clone(),
            zone_name: zone.name.clone(),
            distance_meters: distance,
            within_radius: distance <= zone.radius_meters,
        }
    }
}

/// Closest zone to `coordinate`, or `None` when no zones are configured.
pub fn nearest_zone(coordinate: &Coordinate, zones: &[LocationZone]) -> Option<ZoneProximity> {
    zones
        .iter()
        .map(|zone| ZoneProximity::measure(coordinate, zone))
        .min_by(|left, right| left.distance_meters.total_cmp(&right.distance_meters))
}

/// First zone, in configuration order, whose radius contains `coordinate`.
pub fn admitting_zone(coordinate: &Coordinate, zones: &[LocationZone]) -> Option<ZoneProximity> {
    zones
        .iter()
        .map(|zone| ZoneProximity::measure(coordinate, zone))
        .find(|proximity| proximity.within_radius)
}
