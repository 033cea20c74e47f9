mod common;

use chrono::{DateTime, Duration, Utc};
use common::*;
use fitstake_core::*;

fn ledger_with(c: Commitment) -> CommitmentLedger<InMemoryStore> {
    let store = InMemoryStore::new();
    store.insert_commitment(c).unwrap();
    CommitmentLedger::new(store, RuleEngine::new())
}

fn draft(id: &str, at: DateTime<Utc>) -> SessionDraft {
    SessionDraft {
        id: id.into(),
        commitment_id: "c1".into(),
        date: at,
        duration_min: 30,
        distance_km: Some(5.0),
        heart_rate: Some(150.0),
    }
}

#[test]
fn four_per_week_for_two_weeks_pays_out() {
    let ledger = ledger_with(commitment("4x per week", date(2024, 1, 1), date(2024, 1, 15)));
    let days = [1, 2, 3, 4, 8, 9, 10, 11];

    for (i, d) in days.iter().enumerate() {
        let at = utc(2024, 1, *d, 7, 0);
        let out = ledger
            .record_verified_session(draft(&format!("s{i}"), at), at + Duration::hours(1))
            .unwrap();
        match out {
            RecordOutcome::Recorded {
                session,
                progress,
                settlement,
            } => {
                assert!(session.verified);
                assert_eq!(progress.status, CommitmentStatus::Active);
                assert_eq!(progress.total_sessions_completed, i as u32 + 1);
                assert!(settlement.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    let (p, settlement) = ledger.evaluate("c1", utc(2024, 1, 15, 0, 1)).unwrap();
    assert_eq!(p.status, CommitmentStatus::Completed);
    assert_eq!(settlement, Some(Settlement::Payout { amount: 60.0 }));

    let stored = ledger.store().get_commitment("c1").unwrap();
    assert_eq!(stored.status, CommitmentStatus::Completed);
    assert_eq!(stored.payout_status, Some(PayoutStatus::Pending));
    assert_eq!(stored.last_evaluated_at, Some(utc(2024, 1, 15, 0, 1)));

    // idempotent: ingen ny utbetaling
    let (p, settlement) = ledger.evaluate("c1", utc(2024, 1, 20, 0, 0)).unwrap();
    assert_eq!(p.status, CommitmentStatus::Completed);
    assert!(settlement.is_none());
}

#[test]
fn missed_deadline_forfeits_stake() {
    let ledger = ledger_with(commitment("3x per week", date(2024, 1, 1), date(2024, 1, 15)));
    let at = utc(2024, 1, 2, 7, 0);
    ledger.record_verified_session(draft("s0", at), at).unwrap();

    let (p, settlement) = ledger.evaluate("c1", utc(2024, 1, 7, 12, 0)).unwrap();
    assert_eq!(p.status, CommitmentStatus::Failed);
    assert_eq!(settlement, Some(Settlement::Forfeit { amount: 50.0 }));

    let stored = ledger.store().get_commitment("c1").unwrap();
    assert_eq!(stored.status, CommitmentStatus::Failed);
    assert_eq!(stored.payout_status, None);
}

#[test]
fn second_session_same_day_is_refused() {
    let ledger = ledger_with(commitment("3x per week", date(2024, 1, 1), date(2024, 1, 15)));
    let morning = utc(2024, 1, 2, 7, 0);
    let evening = utc(2024, 1, 2, 19, 0);

    ledger.record_verified_session(draft("s0", morning), morning).unwrap();
    assert!(!ledger.can_record_on("c1", evening).unwrap());
    assert!(ledger.can_record_on("c1", utc(2024, 1, 3, 0, 0)).unwrap());

    let out = ledger.record_verified_session(draft("s1", evening), evening).unwrap();
    assert_eq!(out, RecordOutcome::AlreadyRecordedToday);
    assert_eq!(ledger.store().list_sessions("c1").unwrap().len(), 1);
}

#[test]
fn closed_commitment_refuses_sessions() {
    let mut c = commitment("3x per week", date(2024, 1, 1), date(2024, 1, 15));
    c.status = CommitmentStatus::Failed;
    let ledger = ledger_with(c);

    let at = utc(2024, 1, 9, 7, 0);
    let err = ledger.record_verified_session(draft("s0", at), at).unwrap_err();
    assert!(matches!(err, CoreError::CommitmentClosed(id) if id == "c1"));
    assert!(ledger.store().list_sessions("c1").unwrap().is_empty());
}

#[test]
fn unknown_commitment_is_an_error() {
    let ledger = ledger_with(commitment("3x per week", date(2024, 1, 1), date(2024, 1, 15)));
    let err = ledger.evaluate("nope", utc(2024, 1, 2, 0, 0)).unwrap_err();
    assert!(matches!(err, CoreError::CommitmentNotFound(_)));
}

#[test]
fn concurrent_same_day_records_store_exactly_one() {
    let ledger = ledger_with(commitment("3x per week", date(2024, 1, 1), date(2024, 1, 15)));
    let at = utc(2024, 1, 2, 7, 0);

    let outcomes: Vec<RecordOutcome> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let ledger = &ledger;
                scope.spawn(move || {
                    ledger
                        .record_verified_session(draft(&format!("s{i}"), at + Duration::minutes(i)), at)
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let recorded = outcomes
        .iter()
        .filter(|o| matches!(o, RecordOutcome::Recorded { .. }))
        .count();
    assert_eq!(recorded, 1);
    assert_eq!(ledger.store().list_sessions("c1").unwrap().len(), 1);
}

#[test]
fn payout_and_loss_amounts() {
    let c = Commitment::new("c1", "Running", "3x per week", 50.0, date(2024, 1, 1), date(2024, 1, 15))
        .with_bonus(10.0);
    assert_eq!(payout_amount(&c), 60.0);
    assert_eq!(loss_amount(&c), 50.0);

    let no_bonus = Commitment::new("c2", "Yoga", "Daily", 25.0, date(2024, 1, 1), date(2024, 1, 8));
    assert_eq!(payout_amount(&no_bonus), 25.0);

    assert_eq!(payout::amount_in_cents(60.0), 6000);
    assert_eq!(payout::amount_in_cents(12.5), 1250);
    assert_eq!(payout::default_bonus(100.0), 20.0);
    assert_eq!(payout::default_bonus(50.0), 10.0);
    assert_eq!(payout::default_bonus(49.99), 5.0);

    assert_eq!(Settlement::for_status(&c, CommitmentStatus::Active), None);
    assert_eq!(Settlement::for_status(&c, CommitmentStatus::Paused), None);
    let json = serde_json::to_value(Settlement::for_status(&c, CommitmentStatus::Completed)).unwrap();
    assert_eq!(json["kind"], "payout");
    assert_eq!(json["amount"], 60.0);
}

#[test]
fn created_commitment_derives_end_date_and_bonus() {
    use fitstake_core::models::{duration_days, duration_label};

    assert_eq!(duration_days("1 Week"), 7);
    assert_eq!(duration_days("2 Weeks"), 14);
    assert_eq!(duration_days("3 Weeks"), 21);
    assert_eq!(duration_days("1 Month"), 30);
    assert_eq!(duration_days("whenever"), 30);
    assert_eq!(duration_label(14), "2 Weeks");
    assert_eq!(duration_label(10), "10 Days");

    let c = Commitment::create("c9", "Running", "2 Weeks", "4x per week", 100.0, date(2024, 1, 1));
    assert_eq!(c.end_date, date(2024, 1, 15));
    assert_eq!(c.bonus, Some(20.0));
    assert_eq!(c.duration, "2 Weeks");
    assert_eq!(c.title, "Running Challenge");
    assert_eq!(c.description, "Running 4x per week for 2 Weeks");
    assert_eq!(c.status, CommitmentStatus::Active);
    assert_eq!(payout_amount(&c), 120.0);

    let small = Commitment::create("c10", "Yoga", "1 Month", "Daily", 25.0, date(2024, 2, 1));
    assert_eq!(small.end_date, date(2024, 3, 2));
    assert_eq!(small.bonus, Some(5.0));

    let mid = Commitment::create("c11", "Cycling", "1 Week", "3x per week", 50.0, date(2024, 1, 1));
    assert_eq!(mid.end_date, date(2024, 1, 8));
    assert_eq!(mid.bonus, Some(10.0));

    // skjema-opprettet forpliktelse går gjennom regelmotoren som alle andre
    let ledger = ledger_with(Commitment::create("c1", "Running", "1 Week", "3x per week", 50.0, date(2024, 1, 1)));
    let (p, _) = ledger.evaluate("c1", utc(2024, 1, 2, 0, 0)).unwrap();
    assert_eq!(p.total_weeks, 1);
    assert_eq!(p.status, CommitmentStatus::Active);
}

#[test]
fn locks_exist_only_for_open_commitments() {
    let ledger = ledger_with(commitment("3x per week", date(2024, 1, 1), date(2024, 1, 8)));

    for i in 0..50 {
        let id = format!("ghost-{i}");
        assert!(matches!(
            ledger.evaluate(&id, utc(2024, 1, 2, 0, 0)),
            Err(CoreError::CommitmentNotFound(_))
        ));
    }
    assert_eq!(ledger.tracked_locks(), 0);

    let at = utc(2024, 1, 2, 7, 0);
    ledger.record_verified_session(draft("s0", at), at).unwrap();
    assert_eq!(ledger.tracked_locks(), 1);

    let (p, _) = ledger.evaluate("c1", utc(2024, 1, 7, 12, 0)).unwrap();
    assert_eq!(p.status, CommitmentStatus::Failed);
    assert_eq!(ledger.tracked_locks(), 0);

    // lukket: avvist, og ingen ny lås blir liggende igjen
    let err = ledger.record_verified_session(draft("s1", utc(2024, 1, 7, 13, 0)), utc(2024, 1, 7, 13, 0));
    assert!(matches!(err, Err(CoreError::CommitmentClosed(_))));
    assert_eq!(ledger.tracked_locks(), 0);
}
