mod common;

use common::*;
use fitstake_core::cli::{format_progress_report, format_verification_report, verify_trace_file};
use fitstake_core::*;
use std::fs;

#[test]
fn verify_trace_from_disk() {
    let path = std::env::temp_dir().join(format!("fitstake_trace_{}.json", std::process::id()));
    fs::write(&path, serde_json::to_string(&easy_run(0)).unwrap()).unwrap();

    let v = verify_trace_file(&path).expect("verify");
    assert!(v.is_verified);

    let report = format_verification_report(&v);
    assert!(report.contains("Status: verified (score 1.00)"));
    assert!(report.contains("Distance: 5.40 km"));
    assert!(!report.contains("  ! ["));

    fs::remove_file(&path).ok();
}

#[test]
fn missing_trace_file_has_context() {
    let err = verify_trace_file("tests/data/nope.json").unwrap_err();
    assert!(format!("{err:#}").contains("reading trace"));
}

#[test]
fn report_lists_flags() {
    let v = verify_session(&trace(vec![], vec![], 0, 60_000));
    let report = format_verification_report(&v);
    assert!(report.contains("Status: rejected"));
    assert!(report.contains("No GPS track recorded"));
}

#[test]
fn progress_report_marks_weeks() {
    let engine = RuleEngine::new();
    let c = commitment("3x per week", date(2024, 1, 1), date(2024, 1, 15));
    let sessions = vec![
        session("a", "c1", utc(2024, 1, 2, 7, 0)),
        session("b", "c1", utc(2024, 1, 3, 7, 0)),
        session("c", "c1", utc(2024, 1, 4, 7, 0)),
    ];
    let p = engine.progress(&c, &sessions, utc(2024, 1, 9, 12, 0));
    let report = format_progress_report(&p);

    assert!(report.contains("Status: active (week 2/2, 3/6 sessions)"));
    assert!(report.contains("✅ week 1: 3/3"));
    assert!(report.contains("⏳ week 2: 0/3"));
    assert!(report.contains("Need 3 more this week"));
}
