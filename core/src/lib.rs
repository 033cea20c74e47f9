//! Fitstake core: verifisering av treningsøkter (GPS + puls → tillitsscore)
//! og regelmotor for innsats-forpliktelser (uke for uke, med tidlig feil).

pub mod analyzer;
pub mod anomaly;
pub mod cli;
pub mod error;
pub mod geo;
pub mod ledger;
pub mod metrics;
pub mod models;
pub mod payout;
pub mod rules;
pub mod scoring;
pub mod storage;
pub mod tracker;
pub mod types;
pub mod verification;

#[cfg(feature = "python")]
pub mod py;

pub use analyzer::analyze_trace;
pub use anomaly::detect_anomalies;
pub use error::{CoreError, VerificationUnavailable};
pub use geo::distance_meters;
pub use ledger::{CommitmentLedger, CommitmentStore, InMemoryStore, RecordOutcome, SessionDraft};
pub use models::{
    Commitment, CommitmentProgress, CommitmentStatus, PayoutStatus, Session, WeeklyRequirement,
};
pub use payout::{loss_amount, payout_amount, Settlement};
pub use rules::{can_still_meet_weekly_requirement, sessions_per_week, RuleEngine};
pub use scoring::{live_score, score_verification, status_for_score, LiveScore, LiveScorer, LiveSnapshot};
pub use storage::{load_config, save_config};
pub use tracker::{SessionOutcome, SessionTracker, Telemetry};
pub use types::*;
pub use verification::{verify_session, LocalVerifier, RemoteVerifier, VerificationService};
