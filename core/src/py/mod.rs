// Python-bindinger (feature "python"). JSON inn / JSON ut, slik at
// app-laget kan kalle kjernen uten å kjenne Rust-typene.

use chrono::{DateTime, Utc};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::wrap_pyfunction;
use serde_json::json;

use crate::error::{parse_json, CoreError};
use crate::models::{Commitment, Session};
use crate::payout::{amount_in_cents, loss_amount, payout_amount};
use crate::rules::RuleEngine;
use crate::types::SessionTrace;
use crate::verification::verify_session;

fn to_py_err(e: CoreError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn to_json<T: serde::Serialize>(v: &T) -> PyResult<String> {
    serde_json::to_string(v).map_err(|e| PyValueError::new_err(format!("serialize: {e}")))
}

fn parse_now(now_rfc3339: Option<&str>) -> PyResult<DateTime<Utc>> {
    match now_rfc3339 {
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| PyValueError::new_err(format!("now: {e}"))),
        None => Ok(Utc::now()),
    }
}

/// SessionTrace-JSON → VerificationVerdict-JSON
#[pyfunction]
fn verify_session_json(trace_json: &str) -> PyResult<String> {
    let trace: SessionTrace = parse_json(trace_json).map_err(to_py_err)?;
    to_json(&verify_session(&trace))
}

/// Commitment + økter → CommitmentProgress-JSON
#[pyfunction]
#[pyo3(signature = (commitment_json, sessions_json, now_rfc3339=None, utc_offset_minutes=0))]
fn commitment_progress_json(
    commitment_json: &str,
    sessions_json: &str,
    now_rfc3339: Option<&str>,
    utc_offset_minutes: i32,
) -> PyResult<String> {
    let commitment: Commitment = parse_json(commitment_json).map_err(to_py_err)?;
    let sessions: Vec<Session> = parse_json(sessions_json).map_err(to_py_err)?;
    let now = parse_now(now_rfc3339)?;

    let cfg = crate::types::CoreConfig {
        utc_offset_minutes,
        ..Default::default()
    };
    let progress = RuleEngine::from_config(&cfg).progress(&commitment, &sessions, now);
    to_json(&progress)
}

#[pyfunction]
fn payout_amounts_json(commitment_json: &str) -> PyResult<String> {
    let c: Commitment = parse_json(commitment_json).map_err(to_py_err)?;
    let payout = payout_amount(&c);
    let loss = loss_amount(&c);
    to_json(&json!({
        "payoutAmount": payout,
        "lossAmount": loss,
        "payoutCents": amount_in_cents(payout),
        "lossCents": amount_in_cents(loss),
    }))
}

#[pymodule]
pub fn fitstake_core(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(verify_session_json, m)?)?;
    m.add_function(wrap_pyfunction!(commitment_progress_json, m)?)?;
    m.add_function(wrap_pyfunction!(payout_amounts_json, m)?)?;
    Ok(())
}
