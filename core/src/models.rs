use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::payout::default_bonus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitmentStatus {
    Active,
    Completed,
    Failed,
    Paused,
}

impl CommitmentStatus {
    /// completed/failed er endelige: kan aldri endres igjen
    pub fn is_terminal(self) -> bool {
        matches!(self, CommitmentStatus::Completed | CommitmentStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CommitmentStatus::Active => "active",
            CommitmentStatus::Completed => "completed",
            CommitmentStatus::Failed => "failed",
            CommitmentStatus::Paused => "paused",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    Pending,
    Completed,
    Failed,
}

/// En innsats-forpliktelse. Betaling er allerede trukket når den opprettes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commitment {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub activity: String,
    pub duration: String,  // f.eks. "2 Weeks"
    pub frequency: String, // f.eks. "4x per week" / "Daily"
    pub stake: f64,
    /// Første dag (inkl.)
    pub start_date: NaiveDate,
    /// Første dag ETTER forpliktelsen (eksl.)
    pub end_date: NaiveDate,
    #[serde(default)]
    pub bonus: Option<f64>,
    pub status: CommitmentStatus,
    #[serde(default)]
    pub payout_status: Option<PayoutStatus>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_evaluated_at: Option<DateTime<Utc>>,
}

/// Dager for en varighetsetikett fra opprettelsesskjemaet. Ukjent etikett => 30.
pub fn duration_days(label: &str) -> u32 {
    match label.trim() {
        "1 Week" => 7,
        "2 Weeks" => 14,
        "3 Weeks" => 21,
        _ => 30,
    }
}

/// Etikett for et antall dager (motsatt vei av `duration_days`).
pub fn duration_label(days: i64) -> String {
    match days {
        7 => "1 Week".into(),
        14 => "2 Weeks".into(),
        21 => "3 Weeks".into(),
        30 => "1 Month".into(),
        d => format!("{d} Days"),
    }
}

impl Commitment {
    /// Ny forpliktelse fra skjemaet: sluttdato fra varigheten, bonus fra innsatsen.
    pub fn create(
        id: impl Into<String>,
        activity: impl Into<String>,
        duration: impl Into<String>,
        frequency: impl Into<String>,
        stake: f64,
        start_date: NaiveDate,
    ) -> Self {
        let duration = duration.into();
        let days = u64::from(duration_days(&duration));
        let end_date = start_date.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX);

        let mut c = Self::new(id, activity, frequency, stake, start_date, end_date)
            .with_bonus(default_bonus(stake));
        c.description = format!("{} {} for {duration}", c.activity, c.frequency);
        c.duration = duration;
        c
    }

    pub fn new(
        id: impl Into<String>,
        activity: impl Into<String>,
        frequency: impl Into<String>,
        stake: f64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        let activity = activity.into();
        let frequency = frequency.into();
        let duration = duration_label((end_date - start_date).num_days().abs());
        Self {
            id: id.into(),
            title: format!("{activity} Challenge"),
            description: format!("{activity} {frequency} for {duration}"),
            activity,
            duration,
            frequency,
            stake,
            start_date,
            end_date,
            bonus: None,
            status: CommitmentStatus::Active,
            payout_status: None,
            created_at: None,
            updated_at: None,
            last_evaluated_at: None,
        }
    }

    pub fn with_bonus(mut self, bonus: f64) -> Self {
        self.bonus = Some(bonus);
        self
    }
}

/// En godkjent økt. Opprettes kun etter verdict med is_verified=true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub commitment_id: String,
    pub date: DateTime<Utc>,
    pub duration: u32, // minutter
    #[serde(default)]
    pub distance: Option<f64>, // km
    #[serde(default)]
    pub heart_rate: Option<f64>, // snitt bpm
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Avledet ukevindu: bygges på nytt ved hver evaluering, lagres aldri.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyRequirement {
    pub week_number: u32, // 1-basert
    pub required_sessions: u32,
    pub completed_sessions: u32,
    pub week_start: DateTime<Utc>,
    pub week_end: DateTime<Utc>, // inkl. (siste ms)
    pub is_completed: bool,
    pub is_failed: bool,
    pub remaining_days: u32,
    #[serde(default)]
    pub session_ids: Vec<String>,
}

impl WeeklyRequirement {
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.week_start && t <= self.week_end
    }

    pub fn sessions_needed(&self) -> u32 {
        self.required_sessions.saturating_sub(self.completed_sessions)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitmentProgress {
    pub commitment: Commitment,
    pub current_week: u32, // 1-basert
    pub total_weeks: u32,
    pub weekly_requirements: Vec<WeeklyRequirement>,
    pub total_sessions_completed: u32,
    pub total_sessions_required: u32,
    pub status: CommitmentStatus,
    pub can_still_succeed: bool,
    pub next_deadline: DateTime<Utc>,
    pub days_remaining_in_week: u32,
    pub sessions_needed_this_week: u32,
}
