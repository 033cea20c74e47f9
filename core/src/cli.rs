use std::fmt::Write as _;
use std::path::Path;

use anyhow::Context;

use crate::error::parse_json;
use crate::models::CommitmentProgress;
use crate::types::{SessionTrace, VerificationVerdict};
use crate::verification::verify_session;

/// Les et JSON-spor fra disk og kjør lokal verifisering.
pub fn verify_trace_file(path: impl AsRef<Path>) -> anyhow::Result<VerificationVerdict> {
    let path = path.as_ref();
    let txt = std::fs::read_to_string(path)
        .with_context(|| format!("reading trace {}", path.display()))?;
    let trace: SessionTrace =
        parse_json(&txt).with_context(|| format!("parsing trace {}", path.display()))?;
    Ok(verify_session(&trace))
}

pub fn format_verification_report(v: &VerificationVerdict) -> String {
    let a = &v.analysis;
    let mut out = String::new();
    let _ = writeln!(out, "--- Verification Report ---");
    let _ = writeln!(out, "Session: {}", v.session_id);
    let _ = writeln!(out, "Status: {} (score {:.2})", v.status.as_str(), v.verification_score);
    let _ = writeln!(
        out,
        "Distance: {:.2} km, avg {:.1} km/h, max {:.1} km/h, +{:.0} m",
        a.total_distance,
        a.average_speed * 3.6,
        a.max_speed * 3.6,
        a.elevation_gain
    );
    let _ = writeln!(
        out,
        "Heart rate: avg {:.0} / max {:.0} bpm, {:.0} kcal",
        a.average_heart_rate, a.max_heart_rate, a.calories_burned
    );
    let _ = writeln!(
        out,
        "Route consistency: {:.2} ({:?}, effort {:?})",
        a.route_consistency, a.movement_pattern, a.estimated_effort
    );
    for f in &v.flags {
        let _ = writeln!(out, "  ! [{:?}/{:?}] {}", f.kind, f.severity, f.message);
    }
    out
}

pub fn format_progress_report(p: &CommitmentProgress) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "--- Commitment {} ---", p.commitment.id);
    let _ = writeln!(
        out,
        "Status: {} (week {}/{}, {}/{} sessions)",
        p.status.as_str(),
        p.current_week,
        p.total_weeks,
        p.total_sessions_completed,
        p.total_sessions_required
    );
    for w in &p.weekly_requirements {
        let mark = if w.is_completed {
            "✅"
        } else if w.is_failed {
            "❌"
        } else {
            "⏳"
        };
        let _ = writeln!(
            out,
            "  {mark} week {}: {}/{}",
            w.week_number, w.completed_sessions, w.required_sessions
        );
    }
    if p.can_still_succeed && !p.status.is_terminal() {
        let _ = writeln!(
            out,
            "Need {} more this week, {} day(s) left (deadline {})",
            p.sessions_needed_this_week,
            p.days_remaining_in_week,
            p.next_deadline.to_rfc3339()
        );
    }
    out
}
