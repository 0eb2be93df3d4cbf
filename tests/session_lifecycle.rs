//! Integration tests for session lifetime: admission, expiry and checkout.
//!
//! These tests verify the end-to-end flow:
//! 1. Admission rejects early and recovers as buckets refill
//! 2. The sweeper retires idle sessions and releases their resources
//! 3. A swept session comes back with fresh state
//! 4. Checkout and confirmation settle a tab through the provider port
//!
//! Time-dependent tests run on a paused clock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use session_ledger::adapters::cleanup::{DownstreamClient, SessionClientCache};
use session_ledger::adapters::payment::MockPaymentProvider;
use session_ledger::adapters::session::{SweeperConfig, SweeperHandle};
use session_ledger::application::{
    ConfirmPaymentCommand, ConfirmPaymentHandler, ConfirmPaymentOutcome, StartCheckoutCommand,
    StartCheckoutHandler, TabService,
};
use session_ledger::config::AppConfig;
use session_ledger::domain::foundation::{ErrorCode, Money, SessionId};
use session_ledger::domain::payment::PaymentStatus;
use session_ledger::ports::{CleanupError, DenyReason, ProviderPaymentStatus};

// =============================================================================
// Test Infrastructure
// =============================================================================

fn m(s: &str) -> Money {
    s.parse().unwrap()
}

fn sid(s: &str) -> SessionId {
    SessionId::new(s).unwrap()
}

/// Downstream client that counts closes.
struct CountingClient {
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl DownstreamClient for CountingClient {
    async fn close(&self) -> Result<(), CleanupError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn sweeper_config() -> SweeperConfig {
    SweeperConfig {
        idle_expiry: Duration::from_secs(300),
        sweep_interval: Duration::from_secs(30),
        cleanup_retries: 1,
    }
}

// =============================================================================
// Admission
// =============================================================================

#[tokio::test(start_paused = true)]
async fn exhausted_session_bucket_recovers_one_request_per_refill_interval() {
    let mut config = AppConfig::default();
    config.admission.session_requests_per_minute = 6; // 0.1 token/s
    config.admission.burst_threshold = 100;
    let service = TabService::from_config(&config);
    let s = sid("chatty");

    for _ in 0..6 {
        assert!(service.check_admission(&s).is_allowed());
    }
    let denied = service.check_admission(&s);
    assert_eq!(denied.reason(), Some(DenyReason::SessionBucket));

    tokio::time::advance(Duration::from_secs(9)).await;
    assert!(service.check_admission(&s).is_denied());

    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(service.check_admission(&s).is_allowed());
    assert!(service.check_admission(&s).is_denied());
}

#[tokio::test(start_paused = true)]
async fn burst_guard_rejects_rapid_fire_then_recovers() {
    let service = TabService::from_config(&AppConfig::default());
    let s = sid("rapid");

    for _ in 0..10 {
        service
            .with_session(&s, |ledger, guard| ledger.charge(guard, m("0.10"), None))
            .await
            .unwrap();
    }
    let err = service
        .with_session(&s, |ledger, guard| ledger.charge(guard, m("0.10"), None))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::RateLimited);

    tokio::time::advance(Duration::from_secs(10)).await;
    assert!(service
        .with_session(&s, |ledger, guard| ledger.charge(guard, m("0.10"), None))
        .await
        .is_ok());
}

// =============================================================================
// Sweeper
// =============================================================================

#[tokio::test(start_paused = true)]
async fn swept_session_returns_with_fresh_record() {
    let service = TabService::from_config(&AppConfig::default());
    let closes = Arc::new(AtomicUsize::new(0));
    let cache = {
        let closes = closes.clone();
        Arc::new(SessionClientCache::new(move |_| CountingClient {
            closes: closes.clone(),
        }))
    };
    let sweeper = service.sweeper(cache.clone(), sweeper_config());
    let s = sid("sleepy");

    service.charge(&s, m("40.00"), None).await.unwrap();
    cache.client(&s);

    tokio::time::advance(Duration::from_secs(301)).await;
    let report = sweeper.sweep_once().await;

    assert_eq!(report.expired, vec![s.clone()]);
    assert_eq!(closes.load(Ordering::SeqCst), 1);
    assert!(!service.locks().contains(&s));
    assert!(!service.registry().contains(&s));
    assert!(service.admission().status(&s).is_none());

    let receipt = service.charge(&s, m("5.00"), None).await.unwrap();
    assert_eq!(receipt.balance, m("995.00"));
    assert_eq!(receipt.version, 1);
}

#[tokio::test(start_paused = true)]
async fn running_sweeper_keeps_active_sessions() {
    let service = TabService::from_config(&AppConfig::default());
    let sweeper = Arc::new(service.sweeper(
        Arc::new(session_ledger::adapters::NoopCleaner),
        sweeper_config(),
    ));
    let handle = SweeperHandle::start(sweeper);

    let active = sid("active");
    let idle = sid("idle");
    service.record_turn(&idle, None).await.unwrap();

    for _ in 0..12 {
        service.record_turn(&active, None).await.unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;
    }

    assert!(service.locks().contains(&active));
    assert!(!service.locks().contains(&idle));

    handle.shutdown().await;
    handle.shutdown().await;
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn checkout_then_confirmation_settles_tab() {
    let service = Arc::new(TabService::from_config(&AppConfig::default()));
    let provider = MockPaymentProvider::new();
    let start = StartCheckoutHandler::new(service.clone(), Arc::new(provider.clone()));
    let confirm = ConfirmPaymentHandler::new(service.clone(), Arc::new(provider.clone()));
    let s = sid("table-12");

    service.place_order(&s, "margherita", 2, m("11.00")).await.unwrap();
    service.set_tip(&s, 20).await.unwrap();

    let started = start
        .handle(StartCheckoutCommand {
            session_id: s.clone(),
            description: Some("Table 12".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(started.record.payment_status(), PaymentStatus::Processing);

    assert_eq!(
        confirm
            .handle(ConfirmPaymentCommand { session_id: s.clone() })
            .await
            .unwrap(),
        ConfirmPaymentOutcome::Pending
    );

    provider.set_status(&started.link.reference, ProviderPaymentStatus::Paid);
    let outcome = confirm
        .handle(ConfirmPaymentCommand { session_id: s.clone() })
        .await
        .unwrap();
    assert!(matches!(outcome, ConfirmPaymentOutcome::Completed(_)));

    let record = service.snapshot_payment_state(&s).await.unwrap();
    assert_eq!(record.payment_status(), PaymentStatus::Completed);
    assert_eq!(record.tab_total(), Money::ZERO);
    assert_eq!(record.balance(), m("978.00"));

    // A new round needs the explicit reset
    assert!(service.reset_payment(&s).await.unwrap());
    service.charge(&s, m("3.00"), None).await.unwrap();
    let record = service.snapshot_payment_state(&s).await.unwrap();
    assert_eq!(record.payment_status(), PaymentStatus::Pending);
    assert_eq!(record.tab_total(), m("3.00"));
}

#[tokio::test]
async fn charges_during_checkout_are_refused_until_settled() {
    let service = Arc::new(TabService::from_config(&AppConfig::default()));
    let provider = MockPaymentProvider::new();
    let start = StartCheckoutHandler::new(service.clone(), Arc::new(provider.clone()));
    let confirm = ConfirmPaymentHandler::new(service.clone(), Arc::new(provider.clone()));
    let s = sid("late-order");

    service.charge(&s, m("10.00"), None).await.unwrap();
    let started = start
        .handle(StartCheckoutCommand {
            session_id: s.clone(),
            description: None,
        })
        .await
        .unwrap();

    let err = service.charge(&s, m("25.00"), None).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidStateTransition);

    provider.set_status(&started.link.reference, ProviderPaymentStatus::Paid);
    let outcome = confirm
        .handle(ConfirmPaymentCommand { session_id: s.clone() })
        .await
        .unwrap();
    assert!(matches!(outcome, ConfirmPaymentOutcome::Completed(_)));

    let record = service.snapshot_payment_state(&s).await.unwrap();
    assert_eq!(record.balance() + record.tab_total(), m("990.00"));
    assert_eq!(record.balance(), m("990.00"));
}

#[tokio::test]
async fn tab_change_during_checkout_is_a_conflict() {
    let service = Arc::new(TabService::from_config(&AppConfig::default()));
    let provider = MockPaymentProvider::new();
    let s = sid("moving");
    let stale = {
        service.charge(&s, m("10.00"), None).await.unwrap();
        service.snapshot_payment_state(&s).await.unwrap()
    };

    // Another request lands between the snapshot and registration
    service.charge(&s, m("1.00"), None).await.unwrap();

    let err = service
        .begin_payment(
            &s,
            session_ledger::domain::foundation::IdempotencyToken::generate(),
            "pay_stale",
            Some(stale.version()),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ConcurrentModification);

    // Starting over through the handler succeeds
    let start = StartCheckoutHandler::new(service.clone(), Arc::new(provider));
    let started = start
        .handle(StartCheckoutCommand {
            session_id: s,
            description: None,
        })
        .await
        .unwrap();
    assert_eq!(started.record.tab_total(), m("11.00"));
}
