use crate::analyzer::mean;
use crate::anomaly::{ACCURATE_FIX_M, MIN_TRACK_POINTS, MISSING_ACCURACY_M};
use crate::geo::distance_meters;
use crate::types::{
    CoreConfig, GpsPoint, LiveWeights, MovementPattern, VerificationAnalysis, VerificationFlag,
    VerificationStatus,
};

/// Terskel for godkjent økt (både autoritativ og live scorer)
pub const ACCEPT_THRESHOLD: f64 = 0.7;
pub const REJECT_THRESHOLD: f64 = 0.3;

/// Tillitsscore 0–1: start 1.0, trekk per flagg (severity × confidence),
/// justering for bevegelsesmønster og pulsbonus.
pub fn score_verification(analysis: &VerificationAnalysis, flags: &[VerificationFlag]) -> f64 {
    let mut score = 1.0f64;

    for f in flags {
        score -= f.severity.deduction() * f.confidence;
    }

    score += match analysis.movement_pattern {
        MovementPattern::Consistent => 0.1,
        MovementPattern::Suspicious => -0.2,
        MovementPattern::Erratic => 0.0,
    };

    let hr = analysis.average_heart_rate;
    if hr > 100.0 && hr < 180.0 {
        score += 0.05;
    }

    score.clamp(0.0, 1.0)
}

pub fn status_for_score(score: f64) -> VerificationStatus {
    if score < REJECT_THRESHOLD {
        VerificationStatus::Rejected
    } else if score < ACCEPT_THRESHOLD {
        VerificationStatus::Suspicious
    } else {
        VerificationStatus::Verified
    }
}

/* -------------------------------------------------------------------------
   Live scorer: kun for tilbakemelding under økta, ikke autoritativ.
   ------------------------------------------------------------------------- */

/// Øyeblikksbilde av en pågående økt.
#[derive(Debug, Clone, Default)]
pub struct LiveSnapshot<'a> {
    pub points: &'a [GpsPoint],
    pub total_distance_m: f64,
    pub duration_secs: f64,
    pub heart_rate: &'a [f64],
    /// Snitt av enhetsrapportert fart (m/s)
    pub average_speed_ms: f64,
}

impl<'a> LiveSnapshot<'a> {
    /// Avled distanse og snittfart fra punktene (fart fra enhetens speed-felt).
    pub fn from_points(points: &'a [GpsPoint], heart_rate: &'a [f64], duration_secs: f64) -> Self {
        let total_distance_m = points
            .windows(2)
            .map(|w| distance_meters(&w[0], &w[1]))
            .sum::<f64>();
        let speeds: Vec<f64> = points.iter().filter_map(|p| p.speed).filter(|v| *v > 0.0).collect();
        Self {
            points,
            total_distance_m,
            duration_secs,
            heart_rate,
            average_speed_ms: mean(&speeds),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveScore {
    pub score: f64,
    pub accepted: bool,
    /// Sum av vektene som faktisk ble brukt
    pub applied_weight: f64,
}

/// Normaliser vektene til sum 1. Ikke-positiv sum => standardvekter.
pub fn normalize_weights(weights: Option<&LiveWeights>) -> LiveWeights {
    let w = weights.copied().unwrap_or_default();
    let sum = w.gps_accuracy + w.distance_time + w.heart_rate + w.movement_regularity + w.duration;
    if sum > 0.0 && sum.is_finite() {
        LiveWeights {
            gps_accuracy: w.gps_accuracy / sum,
            distance_time: w.distance_time / sum,
            heart_rate: w.heart_rate / sum,
            movement_regularity: w.movement_regularity / sum,
            duration: w.duration / sum,
        }
    } else {
        LiveWeights::default()
    }
}

/// Vektet faktorscore; faktorer uten grunnlag hoppes over og vektene re-normaliseres.
pub fn live_score(snap: &LiveSnapshot, weights: Option<&LiveWeights>) -> LiveScore {
    let w = normalize_weights(weights);
    let mut score = 0.0;
    let mut applied = 0.0;

    // GPS-presisjon
    if snap.points.len() > 10 {
        let accurate = snap
            .points
            .iter()
            .filter(|p| p.accuracy.unwrap_or(MISSING_ACCURACY_M) < ACCURATE_FIX_M)
            .count();
        score += (accurate as f64 / snap.points.len() as f64) * w.gps_accuracy;
        applied += w.gps_accuracy;
    }

    // Distanse vs tid; en økt uten spor teller som 0
    if snap.duration_secs > 60.0 {
        if snap.points.len() < MIN_TRACK_POINTS {
            applied += w.distance_time;
        } else if snap.total_distance_m > 0.0 && snap.average_speed_ms > 0.0 {
            let expected = snap.total_distance_m / snap.duration_secs;
            let c = 1.0 - (expected - snap.average_speed_ms).abs() / snap.average_speed_ms;
            score += c.clamp(0.0, 1.0) * w.distance_time;
            applied += w.distance_time;
        }
    }

    // Puls
    if !snap.heart_rate.is_empty() {
        let avg = mean(snap.heart_rate);
        let s = if avg > 100.0 && avg < 200.0 { 1.0 } else { 0.5 };
        score += s * w.heart_rate;
        applied += w.heart_rate;
    }

    // Jevne GPS-oppdateringer
    let regular = if snap.points.len() as f64 > snap.duration_secs / 10.0 { 1.0 } else { 0.5 };
    score += regular * w.movement_regularity;
    applied += w.movement_regularity;

    // Varighet mellom 5 min og 3 t
    let plausible = if snap.duration_secs > 300.0 && snap.duration_secs < 10_800.0 { 1.0 } else { 0.5 };
    score += plausible * w.duration;
    applied += w.duration;

    let score = if applied > 0.0 { (score / applied).clamp(0.0, 1.0) } else { 0.0 };
    LiveScore {
        score,
        accepted: score >= ACCEPT_THRESHOLD,
        applied_weight: applied,
    }
}

/// Live scorer med vektene fra konfigurasjonen (`liveWeights`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveScorer {
    weights: LiveWeights,
}

impl Default for LiveScorer {
    fn default() -> Self {
        Self::new(None)
    }
}

impl LiveScorer {
    pub fn new(weights: Option<&LiveWeights>) -> Self {
        Self {
            weights: normalize_weights(weights),
        }
    }

    pub fn from_config(cfg: &CoreConfig) -> Self {
        Self::new(cfg.live_weights.as_ref())
    }

    pub fn weights(&self) -> &LiveWeights {
        &self.weights
    }

    pub fn score(&self, snap: &LiveSnapshot) -> LiveScore {
        live_score(snap, Some(&self.weights))
    }
}
