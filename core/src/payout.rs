use serde::{Deserialize, Serialize};

use crate::models::{Commitment, CommitmentStatus};

/// Utbetaling ved fullført forpliktelse: innsats + bonus
pub fn payout_amount(c: &Commitment) -> f64 {
    c.stake + c.bonus.unwrap_or(0.0)
}

/// Tap ved feilet forpliktelse: innsatsen
pub fn loss_amount(c: &Commitment) -> f64 {
    c.stake
}

/// Valutaenheter → hele cent (for betalingsleverandøren)
pub fn amount_in_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Standard bonus-trapp ved opprettelse
pub fn default_bonus(stake: f64) -> f64 {
    if stake >= 100.0 {
        20.0
    } else if stake >= 50.0 {
        10.0
    } else {
        5.0
    }
}

/// Hva betalingssiden skal gjøre etter en endelig statusovergang.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Settlement {
    Payout { amount: f64 },
    Forfeit { amount: f64 },
}

impl Settlement {
    /// None for ikke-endelige statuser
    pub fn for_status(c: &Commitment, status: CommitmentStatus) -> Option<Self> {
        match status {
            CommitmentStatus::Completed => Some(Settlement::Payout {
                amount: payout_amount(c),
            }),
            CommitmentStatus::Failed => Some(Settlement::Forfeit {
                amount: loss_amount(c),
            }),
            CommitmentStatus::Active | CommitmentStatus::Paused => None,
        }
    }

    pub fn amount(&self) -> f64 {
        match self {
            Settlement::Payout { amount } | Settlement::Forfeit { amount } => *amount,
        }
    }

    pub fn outcome_label(&self) -> &'static str {
        match self {
            Settlement::Payout { .. } => "payout",
            Settlement::Forfeit { .. } => "forfeit",
        }
    }
}
