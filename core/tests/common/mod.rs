// Felles testdata: syntetiske spor og tidspunkt.
#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use fitstake_core::geo::EARTH_RADIUS_M;
use fitstake_core::{Commitment, DeviceInfo, GpsPoint, HealthSample, Session, SessionTrace};

/// Meter per grad breddegrad (haversine langs meridianen)
pub const M_PER_DEG_LAT: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

pub fn utc(y: i32, m: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, mi, 0).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Rett linje nordover fra Oslo: `n` punkt, `step_m` meter per `dt_ms`.
pub fn straight_run(start_ms: i64, n: usize, step_m: f64, dt_ms: i64, accuracy_m: f64) -> Vec<GpsPoint> {
    let speed = step_m / (dt_ms as f64 / 1000.0);
    (0..n)
        .map(|i| {
            GpsPoint::new(59.91 + (i as f64 * step_m) / M_PER_DEG_LAT, 10.75, start_ms + i as i64 * dt_ms)
                .with_accuracy(accuracy_m)
                .with_speed(speed)
        })
        .collect()
}

pub fn trace(points: Vec<GpsPoint>, heart_rate: Vec<f64>, start_ms: i64, end_ms: i64) -> SessionTrace {
    SessionTrace {
        session_id: "s1".into(),
        commitment_id: "c1".into(),
        activity_type: "Running".into(),
        start_time: start_ms,
        end_time: end_ms,
        gps_points: points,
        health_data: HealthSample {
            heart_rate,
            ..Default::default()
        },
        device_info: DeviceInfo {
            platform: "ios".into(),
            device_id: "test-device".into(),
            app_version: "1.0.0".into(),
        },
    }
}

/// 30 min rolig løp: 3 m/s, 10 s mellom punkt, 5 m presisjon, puls 150.
pub fn easy_run(start_ms: i64) -> SessionTrace {
    let pts = straight_run(start_ms, 181, 30.0, 10_000, 5.0);
    trace(pts, vec![150.0; 30], start_ms, start_ms + 1_800_000)
}

pub fn session(id: &str, commitment_id: &str, at: DateTime<Utc>) -> Session {
    Session {
        id: id.into(),
        commitment_id: commitment_id.into(),
        date: at,
        duration: 30,
        distance: Some(5.0),
        heart_rate: Some(150.0),
        verified: true,
        created_at: at,
    }
}

pub fn commitment(frequency: &str, start: NaiveDate, end: NaiveDate) -> Commitment {
    Commitment::new("c1", "Running", frequency, 50.0, start, end).with_bonus(10.0)
}
