use std::time::Duration;

use log::{debug, info, warn};
use serde::Deserialize;
use ureq::Agent;

use crate::analyzer::analyze_trace;
use crate::anomaly::detect_anomalies;
use crate::error::VerificationUnavailable;
use crate::metrics::{VERIFICATIONS_TOTAL, VERIFICATION_UNAVAILABLE_TOTAL};
use crate::scoring::{score_verification, status_for_score};
use crate::types::{CoreConfig, SessionTrace, VerificationVerdict};

/// Full lokal pipeline: analyse → anomalier → score → verdict.
/// Deterministisk; tåler tomme spor (gir lav score, aldri feil).
pub fn verify_session(trace: &SessionTrace) -> VerificationVerdict {
    let analysis = analyze_trace(trace);
    let flags = detect_anomalies(trace, &analysis);
    let score = score_verification(&analysis, &flags);
    let status = status_for_score(score);

    for f in &flags {
        debug!(
            "session {}: flag {:?}/{:?} ({:.2}) {}",
            trace.session_id, f.kind, f.severity, f.confidence, f.message
        );
    }

    VerificationVerdict {
        session_id: trace.session_id.clone(),
        is_verified: status == crate::types::VerificationStatus::Verified,
        verification_score: score,
        flags,
        analysis,
        status,
    }
}

/// Sømmen mot verifikasjon. Err betyr "fikk ikke svar", aldri "avvist".
pub trait VerificationService {
    fn verify(&self, trace: &SessionTrace) -> Result<VerificationVerdict, VerificationUnavailable>;
}

fn observe(verdict: &VerificationVerdict) {
    VERIFICATIONS_TOTAL
        .with_label_values(&[verdict.status.as_str()])
        .inc();
    info!(
        "session {} verified: status={} score={:.3} flags={}",
        verdict.session_id,
        verdict.status.as_str(),
        verdict.verification_score,
        verdict.flags.len()
    );
}

/// In-process verifisering (ingen nettverk)
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalVerifier;

impl VerificationService for LocalVerifier {
    fn verify(&self, trace: &SessionTrace) -> Result<VerificationVerdict, VerificationUnavailable> {
        let verdict = verify_session(trace);
        observe(&verdict);
        Ok(verdict)
    }
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    data: Option<T>,
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
}

/// Ekstern verifikasjon: enkel blocking-klient (ureq).
/// Ingen lokal fallback: nettfeil gir `VerificationUnavailable`.
pub struct RemoteVerifier {
    agent: Agent,
    base_url: String,
}

impl RemoteVerifier {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/sessions/verify", self.base_url)
    }

    fn call(&self, trace: &SessionTrace) -> Result<VerificationVerdict, VerificationUnavailable> {
        let url = self.endpoint();
        let resp = match self.agent.post(&url).send_json(trace) {
            Ok(r) => r,
            Err(ureq::Error::Status(code, r)) => {
                return Err(VerificationUnavailable::new(format!(
                    "{url} answered {code} {}",
                    r.status_text()
                )))
            }
            // transportfeilen inneholder allerede URL-en
            Err(e) => return Err(VerificationUnavailable::new(e.to_string())),
        };

        let env: ApiEnvelope<VerificationVerdict> = resp
            .into_json()
            .map_err(|e| VerificationUnavailable::new(format!("undecodable response: {e}")))?;

        if env.success == Some(false) {
            return Err(VerificationUnavailable::new(
                env.message.unwrap_or_else(|| "service reported failure".into()),
            ));
        }
        env.data
            .ok_or_else(|| VerificationUnavailable::new("response without data"))
    }
}

impl VerificationService for RemoteVerifier {
    fn verify(&self, trace: &SessionTrace) -> Result<VerificationVerdict, VerificationUnavailable> {
        match self.call(trace) {
            Ok(verdict) => {
                observe(&verdict);
                Ok(verdict)
            }
            Err(e) => {
                VERIFICATION_UNAVAILABLE_TOTAL.inc();
                warn!("session {}: {}", trace.session_id, e);
                Err(e)
            }
        }
    }
}

/// Velg tjeneste ut fra konfig: remote når URL er satt, ellers lokal.
pub fn service_from_config(cfg: &CoreConfig) -> Box<dyn VerificationService + Send + Sync> {
    match cfg.verification_url.as_deref() {
        Some(url) if !url.trim().is_empty() => Box::new(RemoteVerifier::new(
            url,
            Duration::from_secs(cfg.request_timeout_secs.max(1)),
        )),
        _ => Box::new(LocalVerifier),
    }
}
