use ordered_float::OrderedFloat;

use crate::geo::distance_meters;
use crate::types::{EffortLevel, GpsPoint, MovementPattern, SessionTrace, VerificationAnalysis};

/// Maks forskjell (m) mellom to påfølgende segmenter for å telle som "jevn" bevegelse
pub const ROUTE_SEGMENT_TOLERANCE_M: f64 = 50.0;
/// Grov makspuls brukt til pulssone
pub const HR_ZONE_REFERENCE_BPM: f64 = 180.0;

/// Rå akkumulering fra GPS-sporet (meter, m/s)
#[derive(Debug, Clone, Default)]
pub struct TrackTotals {
    pub distance_m: f64,
    pub speeds_ms: Vec<f64>,
    pub elevation_gain_m: f64,
}

pub fn accumulate_track(points: &[GpsPoint]) -> TrackTotals {
    let mut out = TrackTotals::default();
    for w in points.windows(2) {
        let (prev, curr) = (&w[0], &w[1]);
        let d = distance_meters(prev, curr);
        out.distance_m += d;

        let dt = (curr.timestamp - prev.timestamp) as f64 / 1000.0;
        if dt > 0.0 {
            out.speeds_ms.push(d / dt);
        }

        // kun positive høydeendringer teller
        if let (Some(a0), Some(a1)) = (prev.altitude, curr.altitude) {
            if a1 > a0 {
                out.elevation_gain_m += a1 - a0;
            }
        }
    }
    out
}

#[inline]
pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        0.0
    } else {
        xs.iter().copied().sum::<f64>() / xs.len() as f64
    }
}

#[inline]
pub fn max_or_zero(xs: &[f64]) -> f64 {
    xs.iter().copied().map(OrderedFloat).max().map(|m| m.0).unwrap_or(0.0)
}

/// Standardavvik (populasjon): "variation" i fart
pub fn std_dev(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    let m = mean(xs);
    let var = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / xs.len() as f64;
    var.sqrt()
}

/// Andel tripletter der påfølgende segmentlengder er innen toleransen. 0 ved < 3 punkt.
pub fn route_consistency(points: &[GpsPoint]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let consistent = points
        .windows(3)
        .filter(|w| {
            let d1 = distance_meters(&w[0], &w[1]);
            let d2 = distance_meters(&w[1], &w[2]);
            (d1 - d2).abs() < ROUTE_SEGMENT_TOLERANCE_M
        })
        .count();
    consistent as f64 / (points.len() - 2) as f64
}

pub fn movement_pattern(speeds_ms: &[f64], route_consistency: f64) -> MovementPattern {
    if speeds_ms.is_empty() {
        return MovementPattern::Suspicious;
    }
    let variation = std_dev(speeds_ms);
    if variation < 2.0 && route_consistency > 0.7 {
        MovementPattern::Consistent
    } else if variation > 5.0 || route_consistency < 0.3 {
        MovementPattern::Suspicious
    } else {
        MovementPattern::Erratic
    }
}

pub fn estimate_effort(avg_hr: f64, avg_speed_ms: f64) -> EffortLevel {
    let zone = avg_hr / HR_ZONE_REFERENCE_BPM;
    let kmh = avg_speed_ms * 3.6;
    if zone < 0.6 && kmh < 6.0 {
        EffortLevel::Low
    } else if zone < 0.7 && kmh < 10.0 {
        EffortLevel::Moderate
    } else if zone < 0.85 && kmh < 15.0 {
        EffortLevel::High
    } else {
        EffortLevel::Extreme
    }
}

/// Forenklet kaloriestimat: 10 kcal/min skalert med puls/140, + 0.1 per km.
pub fn estimate_calories(duration_secs: f64, avg_hr: f64, distance_km: f64) -> f64 {
    let minutes = duration_secs / 60.0;
    (10.0 * minutes * (avg_hr / 140.0) + 0.1 * distance_km).round()
}

/// Aggregerte nøkkeltall for en økt. Tåler tomme/rare spor (gir nuller, aldri panic).
pub fn analyze_trace(trace: &SessionTrace) -> VerificationAnalysis {
    let totals = accumulate_track(&trace.gps_points);

    let average_speed = mean(&totals.speeds_ms);
    let max_speed = max_or_zero(&totals.speeds_ms);

    let hr = &trace.health_data.heart_rate;
    let average_heart_rate = mean(hr);
    let max_heart_rate = max_or_zero(hr);

    let consistency = route_consistency(&trace.gps_points);
    let pattern = movement_pattern(&totals.speeds_ms, consistency);
    let effort = estimate_effort(average_heart_rate, average_speed);

    let total_distance_km = totals.distance_m / 1000.0;
    let calories = estimate_calories(trace.duration_secs(), average_heart_rate, total_distance_km);

    VerificationAnalysis {
        total_distance: total_distance_km,
        average_speed,
        max_speed,
        elevation_gain: totals.elevation_gain_m,
        average_heart_rate,
        max_heart_rate,
        calories_burned: calories,
        route_consistency: consistency,
        movement_pattern: pattern,
        estimated_effort: effort,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn std_dev_of_constant_is_zero() {
        assert_eq!(std_dev(&[3.0, 3.0, 3.0]), 0.0);
        assert!((std_dev(&[1.0, 3.0]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn effort_ladder() {
        assert_eq!(estimate_effort(90.0, 1.0), EffortLevel::Low);
        assert_eq!(estimate_effort(120.0, 2.5), EffortLevel::Moderate);
        assert_eq!(estimate_effort(140.0, 3.0), EffortLevel::High);
        assert_eq!(estimate_effort(170.0, 3.0), EffortLevel::Extreme);
        // rask fart alene gir extreme
        assert_eq!(estimate_effort(100.0, 5.0), EffortLevel::Extreme);
    }

    #[test]
    fn calories_rounded() {
        // 30 min, 140 bpm, 5 km => 300 + 0.5
        assert_eq!(estimate_calories(1800.0, 140.0, 5.0), 301.0);
        assert_eq!(estimate_calories(0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn elevation_ignores_descents_and_missing_altitude() {
        let pts = vec![
            GpsPoint::new(59.0, 10.0, 0).with_altitude(100.0),
            GpsPoint::new(59.0001, 10.0, 1_000).with_altitude(110.0),
            GpsPoint::new(59.0002, 10.0, 2_000).with_altitude(95.0),
            GpsPoint::new(59.0003, 10.0, 3_000),
            GpsPoint::new(59.0004, 10.0, 4_000).with_altitude(99.0),
        ];
        let t = accumulate_track(&pts);
        assert!((t.elevation_gain_m - 10.0).abs() < 1e-9);
        assert_eq!(t.speeds_ms.len(), 4);
    }
}
