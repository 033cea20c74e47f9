use log::debug;

use crate::geo::implied_speed_ms;
use crate::types::{FlagType, GpsPoint, Severity, SessionTrace, VerificationAnalysis, VerificationFlag};

pub const MAX_PLAUSIBLE_SPEED_MS: f64 = 15.0; // ~54 km/t
pub const TELEPORT_SPEED_MS: f64 = 20.0; // ~72 km/t
pub const ACCURATE_FIX_M: f64 = 10.0;
/// Punkt uten accuracy regnes som 100 m (dvs. unøyaktige)
pub const MISSING_ACCURACY_M: f64 = 100.0;
pub const MIN_ACCURATE_RATIO: f64 = 0.5;
pub const HR_MIN_BPM: f64 = 80.0;
pub const HR_MAX_BPM: f64 = 200.0;
/// Færre punkt enn dette gir ingen målbar distanse
pub const MIN_TRACK_POINTS: usize = 2;

/// Andel GPS-punkt med accuracy < 10 m. Tomt spor => 0.
pub fn accurate_fix_ratio(points: &[GpsPoint]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let accurate = points
        .iter()
        .filter(|p| p.accuracy.unwrap_or(MISSING_ACCURACY_M) < ACCURATE_FIX_M)
        .count();
    accurate as f64 / points.len() as f64
}

/// Tidsstempler som går bakover (punkt-indeks), eller slutt før start.
pub fn find_time_reversal(trace: &SessionTrace) -> Option<usize> {
    if trace.end_time < trace.start_time {
        return Some(0);
    }
    trace
        .gps_points
        .windows(2)
        .position(|w| w[1].timestamp < w[0].timestamp)
        .map(|i| i + 1)
}

/// Første par med implisert fart over grensen ("teleportering"), eller None.
pub fn find_teleport(points: &[GpsPoint]) -> Option<(usize, f64)> {
    points.windows(2).enumerate().find_map(|(i, w)| {
        implied_speed_ms(&w[0], &w[1])
            .filter(|v| *v > TELEPORT_SPEED_MS)
            .map(|v| (i + 1, v))
    })
}

/// Svindelsignaler i fast rekkefølge: fart, GPS, puls, teleportering,
/// tidsmanipulasjon, manglende spor. Ingen dedup.
pub fn detect_anomalies(trace: &SessionTrace, analysis: &VerificationAnalysis) -> Vec<VerificationFlag> {
    let mut flags = Vec::new();

    // 1️⃣ Urealistisk toppfart
    if analysis.max_speed > MAX_PLAUSIBLE_SPEED_MS {
        flags.push(VerificationFlag {
            kind: FlagType::SpeedAnomaly,
            severity: Severity::High,
            message: format!(
                "Maximum speed of {:.1} km/h is unrealistic for {}",
                analysis.max_speed * 3.6,
                trace.activity_type.to_lowercase()
            ),
            confidence: 0.95,
        });
    }

    // 2️⃣ Dårlig GPS-presisjon (tomt spor gir ratio 0 => flagg)
    let ratio = accurate_fix_ratio(&trace.gps_points);
    if ratio < MIN_ACCURATE_RATIO {
        flags.push(VerificationFlag {
            kind: FlagType::GpsInconsistency,
            severity: Severity::Medium,
            message: "Poor GPS accuracy detected - possible indoor activity or GPS spoofing".into(),
            confidence: 0.7,
        });
    }

    // 3️⃣ Puls utenfor fornuftig område (manglende puls => snitt 0 => flagg)
    let avg_hr = analysis.average_heart_rate;
    if avg_hr < HR_MIN_BPM || avg_hr > HR_MAX_BPM {
        flags.push(VerificationFlag {
            kind: FlagType::HeartRateAnomaly,
            severity: Severity::Medium,
            message: format!("Average heart rate of {avg_hr:.0} BPM is unusual"),
            confidence: 0.6,
        });
    }

    // 4️⃣ Teleportering
    if let Some((idx, v)) = find_teleport(&trace.gps_points) {
        debug!(
            "session {}: jump at point {} implies {:.1} m/s",
            trace.session_id, idx, v
        );
        flags.push(VerificationFlag {
            kind: FlagType::LocationSpoofing,
            severity: Severity::High,
            message: "Sudden location changes detected - possible GPS manipulation".into(),
            confidence: 0.9,
        });
    }

    // 5️⃣ Tid som går bakover
    if let Some(idx) = find_time_reversal(trace) {
        debug!("session {}: timestamps go backwards at {}", trace.session_id, idx);
        flags.push(VerificationFlag {
            kind: FlagType::TimeManipulation,
            severity: Severity::High,
            message: "Timestamps go backwards - possible clock manipulation".into(),
            confidence: 0.8,
        });
    }

    // 6️⃣ Ingen GPS-spor => distansen kan ikke bekreftes
    if trace.gps_points.len() < MIN_TRACK_POINTS {
        flags.push(VerificationFlag {
            kind: FlagType::DistanceMismatch,
            severity: Severity::High,
            message: format!(
                "No GPS track recorded ({} point(s)) - distance cannot be confirmed",
                trace.gps_points.len()
            ),
            confidence: 0.9,
        });
    }

    flags
}
