use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Egen registry for kjernen (ikke prometheus' globale default)
pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

// Navn og labels er konstante; feil her er en programmeringsfeil.
fn register<C: prometheus::core::Collector + Clone + 'static>(c: C) -> C {
    if let Err(e) = REGISTRY.register(Box::new(c.clone())) {
        log::warn!("metric already registered: {e}");
    }
    c
}

pub static VERIFICATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register(
        IntCounterVec::new(
            Opts::new("fitstake_verifications_total", "Session verdicts by status"),
            &["status"],
        )
        .expect("valid metric fitstake_verifications_total"),
    )
});

pub static VERIFICATION_UNAVAILABLE_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register(
        IntCounter::new(
            "fitstake_verification_unavailable_total",
            "Verification attempts that could not reach a verdict",
        )
        .expect("valid metric fitstake_verification_unavailable_total"),
    )
});

pub static SESSIONS_RECORDED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register(
        IntCounter::new(
            "fitstake_sessions_recorded_total",
            "Verified sessions appended to a commitment",
        )
        .expect("valid metric fitstake_sessions_recorded_total"),
    )
});

pub static COMMITMENTS_SETTLED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register(
        IntCounterVec::new(
            Opts::new(
                "fitstake_commitments_settled_total",
                "Commitments reaching a terminal status",
            ),
            &["outcome"],
        )
        .expect("valid metric fitstake_commitments_settled_total"),
    )
});

/// Tekstformat (Prometheus exposition) av alle kjernemetrikker.
pub fn gather_text() -> String {
    // tving registrering selv om en teller ikke er brukt ennå
    Lazy::force(&VERIFICATIONS_TOTAL);
    Lazy::force(&VERIFICATION_UNAVAILABLE_TOTAL);
    Lazy::force(&SESSIONS_RECORDED_TOTAL);
    Lazy::force(&COMMITMENTS_SETTLED_TOTAL);

    let mut buf = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&REGISTRY.gather(), &mut buf) {
        log::warn!("metrics encode failed: {e}");
        return String::new();
    }
    String::from_utf8(buf).unwrap_or_default()
}
