//! Én skriver per forpliktelse: sjekk "én økt per dag", legg til økt,
//! regn ut ukene på nytt og lagre en eventuell endelig statusovergang,
//! alt innenfor samme lås.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::error::CoreError;
use crate::metrics::{COMMITMENTS_SETTLED_TOTAL, SESSIONS_RECORDED_TOTAL};
use crate::models::{Commitment, CommitmentProgress, CommitmentStatus, PayoutStatus, Session};
use crate::payout::Settlement;
use crate::rules::RuleEngine;

/// Lagringsgrensesnittet kjernen trenger. Implementeres av lagringslaget.
pub trait CommitmentStore: Send + Sync {
    fn get_commitment(&self, id: &str) -> Result<Commitment, CoreError>;
    fn list_sessions(&self, commitment_id: &str) -> Result<Vec<Session>, CoreError>;
    fn append_session(&self, session: Session) -> Result<(), CoreError>;
    fn update_commitment(&self, commitment: Commitment) -> Result<(), CoreError>;
}

#[derive(Debug)]
struct Entry {
    commitment: Commitment,
    sessions: Vec<Session>,
}

/// Enkel minnebasert store (tester / lokal utvikling)
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: Mutex<HashMap<String, Entry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_commitment(&self, commitment: Commitment) -> Result<(), CoreError> {
        let mut map = self.inner.lock().map_err(|_| CoreError::LockPoisoned)?;
        map.insert(
            commitment.id.clone(),
            Entry {
                commitment,
                sessions: Vec::new(),
            },
        );
        Ok(())
    }
}

impl CommitmentStore for InMemoryStore {
    fn get_commitment(&self, id: &str) -> Result<Commitment, CoreError> {
        let map = self.inner.lock().map_err(|_| CoreError::LockPoisoned)?;
        map.get(id)
            .map(|e| e.commitment.clone())
            .ok_or_else(|| CoreError::CommitmentNotFound(id.to_string()))
    }

    fn list_sessions(&self, commitment_id: &str) -> Result<Vec<Session>, CoreError> {
        let map = self.inner.lock().map_err(|_| CoreError::LockPoisoned)?;
        map.get(commitment_id)
            .map(|e| e.sessions.clone())
            .ok_or_else(|| CoreError::CommitmentNotFound(commitment_id.to_string()))
    }

    fn append_session(&self, session: Session) -> Result<(), CoreError> {
        let mut map = self.inner.lock().map_err(|_| CoreError::LockPoisoned)?;
        let entry = map
            .get_mut(&session.commitment_id)
            .ok_or_else(|| CoreError::CommitmentNotFound(session.commitment_id.clone()))?;
        entry.sessions.push(session);
        Ok(())
    }

    fn update_commitment(&self, commitment: Commitment) -> Result<(), CoreError> {
        let mut map = self.inner.lock().map_err(|_| CoreError::LockPoisoned)?;
        let entry = map
            .get_mut(&commitment.id)
            .ok_or_else(|| CoreError::CommitmentNotFound(commitment.id.clone()))?;
        entry.commitment = commitment;
        Ok(())
    }
}

/// Data for en økt som har bestått verifisering
#[derive(Debug, Clone, PartialEq)]
pub struct SessionDraft {
    pub id: String,
    pub commitment_id: String,
    pub date: DateTime<Utc>,
    pub duration_min: u32,
    pub distance_km: Option<f64>,
    pub heart_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Recorded {
        session: Session,
        progress: CommitmentProgress,
        settlement: Option<Settlement>,
    },
    /// Allerede en økt denne kalenderdagen: ingenting lagret
    AlreadyRecordedToday,
}

pub struct CommitmentLedger<S> {
    store: S,
    rules: RuleEngine,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: CommitmentStore> CommitmentLedger<S> {
    pub fn new(store: S, rules: RuleEngine) -> Self {
        Self {
            store,
            rules,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn rules(&self) -> &RuleEngine {
        &self.rules
    }

    /// Ukjent id gir feil uten å opprette en lås
    fn lock_for(&self, commitment_id: &str) -> Result<Arc<Mutex<()>>, CoreError> {
        self.store.get_commitment(commitment_id)?;
        let mut locks = self.locks.lock().map_err(|_| CoreError::LockPoisoned)?;
        Ok(locks
            .entry(commitment_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }

    // Endelig status skrives aldri om, så låsen trengs ikke lenger
    fn release_lock(&self, commitment_id: &str) -> Result<(), CoreError> {
        self.locks
            .lock()
            .map_err(|_| CoreError::LockPoisoned)?
            .remove(commitment_id);
        Ok(())
    }

    /// Antall forpliktelser med en aktiv lås
    pub fn tracked_locks(&self) -> usize {
        self.locks
            .lock()
            .map_or_else(|poisoned| poisoned.into_inner().len(), |locks| locks.len())
    }

    /// Kan det registreres en økt på `date`? (les-bare forhåndssjekk)
    pub fn can_record_on(&self, commitment_id: &str, date: DateTime<Utc>) -> Result<bool, CoreError> {
        let dates: Vec<_> = self
            .store
            .list_sessions(commitment_id)?
            .iter()
            .map(|s| s.date)
            .collect();
        Ok(self.rules.can_record_session(date, &dates))
    }

    /// Legg til en verifisert økt og evaluer forpliktelsen: atomisk per forpliktelse.
    pub fn record_verified_session(
        &self,
        draft: SessionDraft,
        now: DateTime<Utc>,
    ) -> Result<RecordOutcome, CoreError> {
        let lock = self.lock_for(&draft.commitment_id)?;
        let _guard = lock.lock().map_err(|_| CoreError::LockPoisoned)?;

        let commitment = self.store.get_commitment(&draft.commitment_id)?;
        if commitment.status.is_terminal() {
            warn!(
                "commitment {} is {}, refusing session {}",
                commitment.id,
                commitment.status.as_str(),
                draft.id
            );
            self.release_lock(&commitment.id)?;
            return Err(CoreError::CommitmentClosed(commitment.id));
        }

        let mut sessions = self.store.list_sessions(&commitment.id)?;
        let dates: Vec<_> = sessions.iter().map(|s| s.date).collect();
        if !self.rules.can_record_session(draft.date, &dates) {
            warn!(
                "commitment {}: session {} refused, already one on {}",
                commitment.id,
                draft.id,
                self.rules.calendar_day(draft.date)
            );
            return Ok(RecordOutcome::AlreadyRecordedToday);
        }

        let session = Session {
            id: draft.id,
            commitment_id: commitment.id.clone(),
            date: draft.date,
            duration: draft.duration_min,
            distance: draft.distance_km,
            heart_rate: draft.heart_rate,
            verified: true,
            created_at: now,
        };
        self.store.append_session(session.clone())?;
        SESSIONS_RECORDED_TOTAL.inc();
        sessions.push(session.clone());

        let (progress, settlement) = self.settle(commitment, &sessions, now)?;
        if progress.status.is_terminal() {
            self.release_lock(&progress.commitment.id)?;
        }
        Ok(RecordOutcome::Recorded {
            session,
            progress,
            settlement,
        })
    }

    /// Evaluer uten ny økt (f.eks. når en frist har passert).
    pub fn evaluate(
        &self,
        commitment_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(CommitmentProgress, Option<Settlement>), CoreError> {
        let lock = self.lock_for(commitment_id)?;
        let _guard = lock.lock().map_err(|_| CoreError::LockPoisoned)?;

        let commitment = self.store.get_commitment(commitment_id)?;
        let sessions = self.store.list_sessions(commitment_id)?;
        let settled = self.settle(commitment, &sessions, now)?;
        if settled.0.status.is_terminal() {
            self.release_lock(commitment_id)?;
        }
        Ok(settled)
    }

    // Kalles med låsen holdt. Kun fremover: active/paused → completed|failed.
    fn settle(
        &self,
        mut commitment: Commitment,
        sessions: &[Session],
        now: DateTime<Utc>,
    ) -> Result<(CommitmentProgress, Option<Settlement>), CoreError> {
        let mut progress = self.rules.progress(&commitment, sessions, now);

        if commitment.status.is_terminal() || !progress.status.is_terminal() {
            return Ok((progress, None));
        }

        let settlement = Settlement::for_status(&commitment, progress.status);
        commitment.status = progress.status;
        if progress.status == CommitmentStatus::Completed {
            commitment.payout_status = Some(PayoutStatus::Pending);
        }
        commitment.updated_at = Some(now);
        commitment.last_evaluated_at = Some(now);
        self.store.update_commitment(commitment.clone())?;
        progress.commitment = commitment;

        if let Some(s) = &settlement {
            COMMITMENTS_SETTLED_TOTAL
                .with_label_values(&[s.outcome_label()])
                .inc();
            info!(
                "commitment {} -> {} ({} {:.2})",
                progress.commitment.id,
                progress.status.as_str(),
                s.outcome_label(),
                s.amount()
            );
        }
        Ok((progress, settlement))
    }
}
