use crate::types::GpsPoint;

/// Jordradius (m)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Storsirkelavstand (haversine) i meter mellom to GPS-punkt.
/// NaN inn gir NaN ut: kaller filtrerer.
pub fn distance_meters(a: &GpsPoint, b: &GpsPoint) -> f64 {
    haversine_m(a.latitude, a.longitude, b.latitude, b.longitude)
}

#[inline]
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// Implisert fart (m/s) mellom to punkt, None hvis Δt <= 0.
pub fn implied_speed_ms(a: &GpsPoint, b: &GpsPoint) -> Option<f64> {
    let dt = (b.timestamp - a.timestamp) as f64 / 1000.0;
    if dt > 0.0 {
        Some(distance_meters(a, b) / dt)
    } else {
        None
    }
}
