use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::error::CoreError;
use crate::ledger::{CommitmentLedger, CommitmentStore, RecordOutcome, SessionDraft};
use crate::models::{CommitmentProgress, Session};
use crate::payout::Settlement;
use crate::scoring::{LiveScore, LiveScorer, LiveSnapshot};
use crate::types::{DeviceInfo, GpsPoint, HealthSample, SessionTrace, VerificationVerdict};
use crate::verification::VerificationService;

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSession {
    pub session_id: String,
    pub commitment_id: String,
    pub activity: String,
    pub started_at: DateTime<Utc>,
}

/// Det enheten har samlet inn når økta stoppes
#[derive(Debug, Clone, Default)]
pub struct Telemetry {
    pub gps_points: Vec<GpsPoint>,
    pub health: HealthSample,
    pub device_info: DeviceInfo,
}

/// Endelig utfall av en økt. Alle varianter er forventede forretningsutfall.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Recorded {
        session: Session,
        progress: CommitmentProgress,
        settlement: Option<Settlement>,
    },
    /// Verifisert som suspicious/rejected: ingenting lagret
    Rejected { verdict: VerificationVerdict },
    /// Fikk ikke svar fra verifisering: ingenting lagret, kan prøves igjen
    Unavailable { reason: String },
    AlreadyRecordedToday { verdict: VerificationVerdict },
    /// Brukeren avbrøt: ingenting lagret, forpliktelsen urørt
    Cancelled { session_id: String },
}

/// Livssyklus for én økt: idle → tracking → idle.
pub struct SessionTracker<'a, S> {
    verifier: &'a dyn VerificationService,
    ledger: &'a CommitmentLedger<S>,
    live: LiveScorer,
    active: Option<ActiveSession>,
}

impl<'a, S: CommitmentStore> SessionTracker<'a, S> {
    pub fn new(verifier: &'a dyn VerificationService, ledger: &'a CommitmentLedger<S>) -> Self {
        Self {
            verifier,
            ledger,
            live: LiveScorer::default(),
            active: None,
        }
    }

    pub fn with_live_scorer(mut self, live: LiveScorer) -> Self {
        self.live = live;
        self
    }

    pub fn is_tracking(&self) -> bool {
        self.active.is_some()
    }

    pub fn current(&self) -> Option<&ActiveSession> {
        self.active.as_ref()
    }

    pub fn start(
        &mut self,
        commitment_id: &str,
        activity: &str,
        now: DateTime<Utc>,
    ) -> Result<&ActiveSession, CoreError> {
        if let Some(a) = &self.active {
            return Err(CoreError::SessionInProgress(a.session_id.clone()));
        }
        let commitment = self.ledger.store().get_commitment(commitment_id)?;
        if commitment.status.is_terminal() {
            return Err(CoreError::CommitmentClosed(commitment.id));
        }

        let session = ActiveSession {
            session_id: format!("session_{}", now.timestamp_millis()),
            commitment_id: commitment.id,
            activity: activity.to_string(),
            started_at: now,
        };
        info!("started {} for {}", session.session_id, session.commitment_id);
        Ok(self.active.insert(session))
    }

    /// Stopp, verifiser og (hvis godkjent) registrer økta.
    pub fn stop(&mut self, telemetry: Telemetry, now: DateTime<Utc>) -> Result<SessionOutcome, CoreError> {
        let active = self.active.take().ok_or(CoreError::NoSessionInProgress)?;

        let mut health = telemetry.health;
        if health.workout_type.is_none() {
            health.workout_type = Some(active.activity.clone());
        }
        let trace = SessionTrace {
            session_id: active.session_id.clone(),
            commitment_id: active.commitment_id.clone(),
            activity_type: active.activity.clone(),
            start_time: active.started_at.timestamp_millis(),
            end_time: now.timestamp_millis(),
            gps_points: telemetry.gps_points,
            health_data: health,
            device_info: telemetry.device_info,
        };

        let verdict = match self.verifier.verify(&trace) {
            Ok(v) => v,
            Err(e) => {
                return Ok(SessionOutcome::Unavailable { reason: e.reason });
            }
        };
        if !verdict.is_verified {
            let msgs: Vec<&str> = verdict.flags.iter().map(|f| f.message.as_str()).collect();
            warn!(
                "session {} not recorded ({}): {}",
                verdict.session_id,
                verdict.status.as_str(),
                msgs.join(", ")
            );
            return Ok(SessionOutcome::Rejected { verdict });
        }

        let minutes = ((now - active.started_at).num_milliseconds() as f64 / 60_000.0)
            .round()
            .max(0.0) as u32;
        let avg_hr = verdict.analysis.average_heart_rate.round();
        let draft = SessionDraft {
            id: active.session_id,
            commitment_id: active.commitment_id,
            date: active.started_at,
            duration_min: minutes,
            distance_km: Some(verdict.analysis.total_distance),
            heart_rate: (avg_hr > 0.0).then_some(avg_hr),
        };

        match self.ledger.record_verified_session(draft, now)? {
            RecordOutcome::Recorded {
                session,
                progress,
                settlement,
            } => Ok(SessionOutcome::Recorded {
                session,
                progress,
                settlement,
            }),
            RecordOutcome::AlreadyRecordedToday => Ok(SessionOutcome::AlreadyRecordedToday { verdict }),
        }
    }

    /// Foreløpig score for det som er samlet inn så langt. Ikke autoritativ.
    pub fn live_feedback(&self, telemetry: &Telemetry, now: DateTime<Utc>) -> Result<LiveScore, CoreError> {
        let active = self.active.as_ref().ok_or(CoreError::NoSessionInProgress)?;
        let secs = (now - active.started_at).num_milliseconds().max(0) as f64 / 1000.0;
        let snap = LiveSnapshot::from_points(&telemetry.gps_points, &telemetry.health.heart_rate, secs);
        Ok(self.live.score(&snap))
    }

    pub fn cancel(&mut self) -> Result<SessionOutcome, CoreError> {
        let active = self.active.take().ok_or(CoreError::NoSessionInProgress)?;
        info!("cancelled {}", active.session_id);
        Ok(SessionOutcome::Cancelled {
            session_id: active.session_id,
        })
    }
}
