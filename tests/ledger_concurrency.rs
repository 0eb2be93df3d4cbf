//! Integration tests for concurrent ledger access.
//!
//! These tests verify, across real worker threads:
//! 1. Compare-and-swap charges: one winner per version
//! 2. Serialized mutations never overdraw a balance
//! 3. Independent sessions make progress in parallel
//! 4. The end-to-end tab scenario through the public facade

use std::sync::Arc;

use session_ledger::application::TabService;
use session_ledger::config::AppConfig;
use session_ledger::domain::foundation::{ErrorCode, Money, SessionId};
use session_ledger::domain::payment::LedgerError;

// =============================================================================
// Test Infrastructure
// =============================================================================

fn m(s: &str) -> Money {
    s.parse().unwrap()
}

fn sid(s: &str) -> SessionId {
    SessionId::new(s).unwrap()
}

fn service() -> Arc<TabService> {
    Arc::new(TabService::from_config(&AppConfig::default()))
}

// =============================================================================
// Compare-and-swap
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn same_expected_version_has_exactly_one_winner() {
    let service = service();
    let s = sid("cas");

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let service = service.clone();
            let s = s.clone();
            tokio::spawn(async move { service.charge(&s, m("1.00"), Some(0)).await })
        })
        .collect();

    let mut winners = 0;
    let mut conflicts = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(receipt) => {
                winners += 1;
                assert_eq!(receipt.version, 1);
            }
            Err(LedgerError::ConcurrentModification { expected, actual, balance }) => {
                conflicts += 1;
                assert_eq!(expected, 0);
                assert_eq!(actual, 1);
                assert_eq!(balance, m("999.00"));
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(conflicts, 15);
    let record = service.snapshot_payment_state(&s).await.unwrap();
    assert_eq!(record.version(), 1);
    assert_eq!(record.balance(), m("999.00"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn losers_converge_by_rereading_and_retrying() {
    let service = service();
    let s = sid("retry");

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let service = service.clone();
            let s = s.clone();
            tokio::spawn(async move {
                loop {
                    let version = service.snapshot_payment_state(&s).await?.version();
                    match service.charge(&s, m("2.50"), Some(version)).await {
                        Err(e) if e.is_retryable() => continue,
                        other => return other,
                    }
                }
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let record = service.snapshot_payment_state(&s).await.unwrap();
    assert_eq!(record.version(), 8);
    assert_eq!(record.balance(), m("980.00"));
    assert_eq!(record.tab_total(), m("20.00"));
}

// =============================================================================
// Balance invariants under contention
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_unversioned_charges_never_overdraw() {
    let service = service();
    let s = sid("drain");

    // 1000.00 / 30.00 admits 33 charges; the rest must fail cleanly
    let tasks: Vec<_> = (0..50)
        .map(|_| {
            let service = service.clone();
            let s = s.clone();
            tokio::spawn(async move { service.charge(&s, m("30.00"), None).await })
        })
        .collect();

    let mut accepted = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(e) => assert_eq!(e.code(), ErrorCode::InsufficientFunds),
        }
    }

    assert_eq!(accepted, 33);
    let record = service.snapshot_payment_state(&s).await.unwrap();
    assert_eq!(record.balance(), m("10.00"));
    assert_eq!(record.tab_total(), m("990.00"));
    assert_eq!(record.version(), 33);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sessions_are_isolated() {
    let service = service();

    let tasks: Vec<_> = (0..10)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move {
                let s = sid(&format!("guest-{i}"));
                for _ in 0..10 {
                    service.charge(&s, m("1.00"), None).await.unwrap();
                }
                service.snapshot_payment_state(&s).await.unwrap()
            })
        })
        .collect();

    for task in tasks {
        let record = task.await.unwrap();
        assert_eq!(record.balance(), m("990.00"));
        assert_eq!(record.version(), 10);
    }
    assert_eq!(service.locks().len(), 10);
}

// =============================================================================
// Scenario
// =============================================================================

#[tokio::test]
async fn tab_scenario_through_facade() {
    let service = service();
    let s = sid("scenario");

    let receipt = service.charge(&s, m("12.50"), None).await.unwrap();
    assert_eq!(receipt.balance, m("987.50"));
    assert_eq!(receipt.version, 1);

    let err = service.charge(&s, m("2000.00"), None).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InsufficientFunds);
    assert_eq!(err.balance(), Some(m("987.50")));
    assert_eq!(service.snapshot_payment_state(&s).await.unwrap().version(), 1);

    let tip = service.set_tip(&s, 15).await.unwrap();
    assert_eq!(tip.tip_amount, m("1.875"));
    assert_eq!(tip.total, m("14.375"));

    let cleared = service.set_tip(&s, 15).await.unwrap();
    assert_eq!(cleared.tip_amount, Money::ZERO);
    assert_eq!(cleared.total, m("12.50"));
    assert!(cleared.tip.is_none());

    let err = service.set_tip(&s, 12).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidTipPercentage);
}
