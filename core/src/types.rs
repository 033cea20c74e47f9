use serde::{Deserialize, Serialize};

// ──────────────────────────────────────────────────────────────────────────────
// Telemetri inn (fra enheten)
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub altitude: Option<f64>, // meter
    #[serde(default)]
    pub accuracy: Option<f64>, // meter
    #[serde(default)]
    pub speed: Option<f64>, // m/s (enhetsrapportert)
    pub timestamp: i64, // ms epoch
}

impl GpsPoint {
    pub fn new(latitude: f64, longitude: f64, timestamp: i64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            accuracy: None,
            speed: None,
            timestamp,
        }
    }

    pub fn with_accuracy(mut self, accuracy_m: f64) -> Self {
        self.accuracy = Some(accuracy_m);
        self
    }

    pub fn with_altitude(mut self, altitude_m: f64) -> Self {
        self.altitude = Some(altitude_m);
        self
    }

    pub fn with_speed(mut self, speed_ms: f64) -> Self {
        self.speed = Some(speed_ms);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSample {
    #[serde(default)]
    pub heart_rate: Vec<f64>, // bpm
    #[serde(default)]
    pub steps: Option<u32>,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub active_energy_burned: Option<f64>,
    #[serde(default)]
    pub workout_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub app_version: String,
}

/// En ferdig, avsluttet økt slik den sendes til verifisering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTrace {
    pub session_id: String,
    pub commitment_id: String,
    pub activity_type: String,
    pub start_time: i64, // ms epoch
    pub end_time: i64,   // ms epoch
    #[serde(default)]
    pub gps_points: Vec<GpsPoint>,
    #[serde(default, alias = "health")]
    pub health_data: HealthSample,
    #[serde(default)]
    pub device_info: DeviceInfo,
}

impl SessionTrace {
    /// Varighet i sekunder (0 hvis end < start)
    pub fn duration_secs(&self) -> f64 {
        ((self.end_time - self.start_time) as f64 / 1000.0).max(0.0)
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Analyse / verdict ut
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementPattern {
    Consistent,
    Erratic,
    Suspicious,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffortLevel {
    Low,
    Moderate,
    High,
    Extreme,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationAnalysis {
    pub total_distance: f64, // km
    pub average_speed: f64,  // m/s
    pub max_speed: f64,      // m/s
    pub elevation_gain: f64, // m
    pub average_heart_rate: f64,
    pub max_heart_rate: f64,
    pub calories_burned: f64,
    pub route_consistency: f64, // 0–1
    pub movement_pattern: MovementPattern,
    pub estimated_effort: EffortLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagType {
    GpsInconsistency,
    SpeedAnomaly,
    HeartRateAnomaly,
    DistanceMismatch,
    TimeManipulation,
    LocationSpoofing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Trekk i score per flagg før vekting med confidence
    pub fn deduction(self) -> f64 {
        match self {
            Severity::High => 0.3,
            Severity::Medium => 0.2,
            Severity::Low => 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationFlag {
    #[serde(rename = "type")]
    pub kind: FlagType,
    pub severity: Severity,
    pub message: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Verified,
    Suspicious,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VerificationStatus::Verified => "verified",
            VerificationStatus::Suspicious => "suspicious",
            VerificationStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationVerdict {
    pub session_id: String,
    pub is_verified: bool,
    pub verification_score: f64,
    #[serde(default)]
    pub flags: Vec<VerificationFlag>,
    pub analysis: VerificationAnalysis,
    pub status: VerificationStatus,
}

// ──────────────────────────────────────────────────────────────────────────────
// Konfig
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveWeights {
    pub gps_accuracy: f64,       // typ 0.30
    pub distance_time: f64,      // typ 0.25
    pub heart_rate: f64,         // typ 0.20
    pub movement_regularity: f64, // typ 0.15
    pub duration: f64,           // typ 0.10
}

impl Default for LiveWeights {
    fn default() -> Self {
        Self {
            gps_accuracy: 0.30,
            distance_time: 0.25,
            heart_rate: 0.20,
            movement_regularity: 0.15,
            duration: 0.10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoreConfig {
    /// Base-URL for ekstern verifikasjon. None => kun lokal pipeline.
    pub verification_url: Option<String>,
    pub request_timeout_secs: u64,
    /// Fast UTC-offset for kalenderdager (stand-in for lokal tid)
    pub utc_offset_minutes: i32,
    pub live_weights: Option<LiveWeights>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            verification_url: None,
            request_timeout_secs: 10,
            utc_offset_minutes: 0,
            live_weights: None,
        }
    }
}
