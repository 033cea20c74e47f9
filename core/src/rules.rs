//! Regelmotor for forpliktelser.
//!
//! Grunnregler:
//! 1. Frekvensen gir påkrevde økter per uke
//! 2. Kun én økt per kalenderdag teller
//! 3. Ukene er rullerende 7-dagersvinduer fra startdato
//! 4. Oppnås ikke ukemålet innen vinduet slutter, feiler forpliktelsen
//! 5. Kan målet ikke lenger nås med dagene som er igjen, feiler den med en gang
//!
//! Alt er rene funksjoner av (commitment, økter, `now`): ingen skjult klokke.

use std::collections::HashSet;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use log::{debug, warn};

use crate::models::{Commitment, CommitmentProgress, CommitmentStatus, Session, WeeklyRequirement};
use crate::types::CoreConfig;

pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;
pub const WEEK_MS: i64 = 7 * DAY_MS;
pub const DEFAULT_SESSIONS_PER_WEEK: u32 = 3;
/// Lengre forpliktelser kuttes her (ti år)
pub const MAX_COMMITMENT_DAYS: i64 = 3_660;

/// Frekvens-etikett → økter per uke. Ukjent => 3.
pub fn sessions_per_week(frequency: &str) -> u32 {
    const LADDER: [(&str, u32); 7] = [
        ("Daily", 7),
        ("6x", 6),
        ("5x", 5),
        ("4x", 4),
        ("3x", 3),
        ("2x", 2),
        ("1x", 1),
    ];
    LADDER
        .iter()
        .find(|(needle, _)| frequency.contains(needle))
        .map(|(_, n)| *n)
        .unwrap_or(DEFAULT_SESSIONS_PER_WEEK)
}

/// Hele dager igjen til `until` (rundet opp), aldri negativ.
pub fn remaining_days(until: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let diff = (until - now).num_milliseconds();
    if diff <= 0 {
        0
    } else {
        ((diff + DAY_MS - 1) / DAY_MS) as u32
    }
}

/// Kan uka fortsatt nås? Avsluttet uke: kun hvis målet er nådd.
/// Ellers: feil straks hvis det trengs flere økter enn det er dager igjen.
pub fn can_still_meet_weekly_requirement(
    req: &WeeklyRequirement,
    completed_so_far: u32,
    now: DateTime<Utc>,
) -> bool {
    if now > req.week_end {
        return completed_so_far >= req.required_sessions;
    }
    let needed = req.required_sessions.saturating_sub(completed_so_far);
    if needed == 0 {
        return true;
    }
    needed <= req.remaining_days
}

/// Siste millisekund før `t`
fn just_before(t: DateTime<Utc>) -> DateTime<Utc> {
    t.checked_sub_signed(Duration::milliseconds(1)).unwrap_or(t)
}

#[derive(Debug, Clone, Copy)]
pub struct RuleEngine {
    offset: FixedOffset,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::with_offset(Utc.fix())
    }
}

impl RuleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kalenderdager regnes i denne faste offseten (stand-in for lokal tid)
    pub fn with_offset(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn from_config(cfg: &CoreConfig) -> Self {
        match FixedOffset::east_opt(cfg.utc_offset_minutes.saturating_mul(60)) {
            Some(offset) => Self::with_offset(offset),
            None => {
                warn!(
                    "utc_offset_minutes={} out of range, using UTC",
                    cfg.utc_offset_minutes
                );
                Self::default()
            }
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Midnatt (lokal) for en dato, som UTC-instant. Mettes i ytterkant av datoområdet.
    pub fn local_midnight(&self, date: NaiveDate) -> DateTime<Utc> {
        let shift = self.offset.local_minus_utc();
        match date
            .and_time(NaiveTime::MIN)
            .checked_sub_signed(Duration::seconds(i64::from(shift)))
        {
            Some(utc) => Utc.from_utc_datetime(&utc),
            None if shift > 0 => DateTime::<Utc>::MIN_UTC,
            None => DateTime::<Utc>::MAX_UTC,
        }
    }

    pub fn calendar_day(&self, t: DateTime<Utc>) -> NaiveDate {
        t.with_timezone(&self.offset).date_naive()
    }

    /// false hvis det allerede finnes en økt samme kalenderdag
    pub fn can_record_session(&self, date: DateTime<Utc>, existing: &[DateTime<Utc>]) -> bool {
        let day = self.calendar_day(date);
        !existing.iter().any(|d| self.calendar_day(*d) == day)
    }

    fn span(&self, c: &Commitment) -> (NaiveDate, NaiveDate) {
        let (lo, hi) = if c.end_date < c.start_date {
            (c.end_date, c.start_date)
        } else {
            (c.start_date, c.end_date)
        };
        match lo.checked_add_signed(Duration::days(MAX_COMMITMENT_DAYS)) {
            Some(limit) if hi > limit => {
                warn!("commitment {}: {hi} is beyond {MAX_COMMITMENT_DAYS} days, ending at {limit}", c.id);
                (lo, limit)
            }
            _ => (lo, hi),
        }
    }

    /// Første instant ETTER forpliktelsen
    pub fn end_instant(&self, c: &Commitment) -> DateTime<Utc> {
        let (_, hi) = self.span(c);
        self.local_midnight(hi)
    }

    /// Ukevinduer uten økter (completed=0). Siste uke klippes mot sluttdato.
    pub fn build_weekly_requirements(&self, c: &Commitment, now: DateTime<Utc>) -> Vec<WeeklyRequirement> {
        let (lo, hi) = self.span(c);
        let total_days = (hi - lo).num_days();
        let total_weeks = (total_days + 6) / 7;
        let per_week = sessions_per_week(&c.frequency);
        let last_instant = just_before(self.local_midnight(hi));

        (0..total_weeks)
            .map(|i| {
                let first_day = lo.checked_add_signed(Duration::days(7 * i)).unwrap_or(hi);
                let week_start = self.local_midnight(first_day);
                let week_end = first_day
                    .checked_add_signed(Duration::days(7))
                    .map(|next| just_before(self.local_midnight(next)))
                    .map_or(last_instant, |full_end| full_end.min(last_instant));
                WeeklyRequirement {
                    week_number: (i + 1) as u32,
                    required_sessions: per_week,
                    completed_sessions: 0,
                    week_start,
                    week_end,
                    is_completed: false,
                    is_failed: false,
                    remaining_days: remaining_days(week_end, now),
                    session_ids: Vec::new(),
                }
            })
            .collect()
    }

    /// Fordel verifiserte økter på ukene (maks én per kalenderdag).
    /// Returnerer antall økter som ble telt.
    pub fn apply_sessions(
        &self,
        reqs: &mut [WeeklyRequirement],
        sessions: &[Session],
        now: DateTime<Utc>,
    ) -> u32 {
        let mut ordered: Vec<&Session> = sessions.iter().filter(|s| s.verified).collect();
        ordered.sort_by_key(|s| s.date);

        let mut seen_days = HashSet::new();
        let mut counted = 0u32;
        for s in ordered {
            if !seen_days.insert(self.calendar_day(s.date)) {
                debug!("session {} ignored: same day as an earlier session", s.id);
                continue;
            }
            if let Some(req) = reqs.iter_mut().find(|r| r.contains(s.date)) {
                req.completed_sessions += 1;
                req.session_ids.push(s.id.clone());
                counted += 1;
            }
        }

        for req in reqs.iter_mut() {
            req.is_completed = req.completed_sessions >= req.required_sessions;
            req.is_failed = !req.is_completed && now > req.week_end;
        }
        counted
    }

    /// Status for hele forpliktelsen + visningsfelt.
    /// Endelige statuser (completed/failed) re-evalueres aldri bort.
    pub fn evaluate_commitment_status(
        &self,
        c: &Commitment,
        reqs: Vec<WeeklyRequirement>,
        total_completed: u32,
        now: DateTime<Utc>,
    ) -> CommitmentProgress {
        let (lo, _) = self.span(c);
        let start = self.local_midnight(lo);
        let last_instant = just_before(self.end_instant(c));
        let total_weeks = reqs.len();

        let elapsed = (now - start).num_milliseconds();
        let current_idx = if elapsed <= 0 { 0 } else { (elapsed / WEEK_MS) as usize };

        let outcome = if now > last_instant {
            if reqs.iter().all(|r| r.completed_sessions >= r.required_sessions) {
                Some(CommitmentStatus::Completed)
            } else {
                Some(CommitmentStatus::Failed)
            }
        } else {
            let upto = current_idx.min(total_weeks.saturating_sub(1));
            let mut failed = false;
            for req in reqs.iter().take(upto + 1) {
                let ok = if now > req.week_end {
                    req.completed_sessions >= req.required_sessions
                } else {
                    can_still_meet_weekly_requirement(req, req.completed_sessions, now)
                };
                if !ok {
                    debug!(
                        "commitment {}: week {} cannot be met ({}/{}, {} days left)",
                        c.id, req.week_number, req.completed_sessions, req.required_sessions, req.remaining_days
                    );
                    failed = true;
                    break;
                }
            }
            failed.then_some(CommitmentStatus::Failed)
        };

        let status = if c.status.is_terminal() {
            c.status
        } else {
            outcome.unwrap_or(c.status)
        };

        let (next_deadline, sessions_needed_this_week) = match reqs.get(current_idx) {
            Some(r) => (r.week_end, r.sessions_needed()),
            None => (last_instant, 0),
        };

        let total_sessions_required = reqs.iter().map(|r| r.required_sessions).sum();
        // 0 når forpliktelsen ikke har noen uker
        let current_week = (current_idx + 1).min(total_weeks) as u32;

        CommitmentProgress {
            commitment: c.clone(),
            current_week,
            total_weeks: total_weeks as u32,
            total_sessions_completed: total_completed,
            total_sessions_required,
            status,
            can_still_succeed: status != CommitmentStatus::Failed,
            next_deadline,
            days_remaining_in_week: remaining_days(next_deadline, now),
            sessions_needed_this_week,
            weekly_requirements: reqs,
        }
    }

    /// Bygg uker, fordel økter og evaluer: alt fra bunnen av hver gang.
    pub fn progress(&self, c: &Commitment, sessions: &[Session], now: DateTime<Utc>) -> CommitmentProgress {
        let mut reqs = self.build_weekly_requirements(c, now);
        let counted = self.apply_sessions(&mut reqs, sessions, now);
        self.evaluate_commitment_status(c, reqs, counted, now)
    }
}
