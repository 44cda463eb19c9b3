use std::time::Duration as StdDuration;

use chrono::Duration;
use tokio::sync::oneshot;

use super::common::*;

use crate::marketplace::domain::{AccountId, ActorContext, Plan, Role, SubAccountRole};
use crate::marketplace::error::MarketError;
use crate::marketplace::purchase::PurchaseStatus;
use crate::marketplace::sweeper::run_purchase_sweeper;

#[test]
fn joining_is_idempotent_and_keeps_first_quantity() {
    let h = harness();
    let supplier = register(&h.service, Role::Supplier, Plan::Free);
    let buyer = register(&h.service, Role::Employer, Plan::Free);
    let purchase = h
        .service
        .create_purchase(&supplier, new_purchase(2, Duration::days(7)))
        .expect("purchase");

    let first = h
        .service
        .join_purchase(&buyer, &purchase.id, 4)
        .expect("joined");
    let again = h
        .service
        .join_purchase(&buyer, &purchase.id, 10)
        .expect("repeat join");

    assert!(first.is_created());
    assert!(!again.is_created());
    assert_eq!(again.value().quantity, 4);
    assert_eq!(h.service.purchase(&purchase.id).expect("purchase").participants.len(), 1);
}

#[test]
fn supplier_cannot_join_own_purchase() {
    let h = harness();
    let supplier = register(&h.service, Role::Supplier, Plan::Free);
    let purchase = h
        .service
        .create_purchase(&supplier, new_purchase(1, Duration::days(1)))
        .expect("purchase");
    let err = h
        .service
        .join_purchase(&supplier, &purchase.id, 1)
        .expect_err("own purchase");
    assert!(matches!(err, MarketError::Forbidden(_)));
}

#[test]
fn only_registered_principals_join_purchases() {
    let h = harness();
    let supplier = register(&h.service, Role::Supplier, Plan::Free);
    let employer = register(&h.service, Role::Employer, Plan::Standard);
    let purchase = h
        .service
        .create_purchase(&supplier, new_purchase(1, Duration::days(1)))
        .expect("purchase");

    let ghost = ActorContext::new(AccountId::from("acc-ghost"), Role::Employer);
    assert!(matches!(
        h.service.join_purchase(&ghost, &purchase.id, 1),
        Err(MarketError::NotFound { kind: "account", .. })
    ));

    let manager = h
        .service
        .add_sub_account(
            &employer,
            "Lena".to_string(),
            "lena@studio.example".to_string(),
            SubAccountRole::Manager,
        )
        .expect("manager");
    let as_manager = h
        .service
        .context_for_delegate(&employer.account_id, &manager.id)
        .expect("manager context");
    assert!(matches!(
        h.service.join_purchase(&as_manager, &purchase.id, 1),
        Err(MarketError::Forbidden(_))
    ));
    assert!(h
        .service
        .purchase(&purchase.id)
        .expect("purchase")
        .participants
        .is_empty());
}

#[test]
fn under_subscribed_purchase_is_cancelled_at_deadline() {
    let h = harness();
    let supplier = register(&h.service, Role::Supplier, Plan::Free);
    let buyer = register(&h.service, Role::Specialist, Plan::Free);
    let purchase = h
        .service
        .create_purchase(&supplier, new_purchase(3, Duration::hours(2)))
        .expect("purchase");
    h.service
        .join_purchase(&buyer, &purchase.id, 1)
        .expect("joined");

    let summary = h.service.sweep_purchases().expect("sweep");
    assert!(summary.is_empty(), "nothing is due before the deadline");

    h.clock.advance(Duration::hours(2));
    let summary = h.service.sweep_purchases().expect("sweep");
    assert_eq!(summary.cancelled, vec![purchase.id.clone()]);
    assert!(summary.completed.is_empty());

    let stored = h.service.purchase(&purchase.id).expect("purchase");
    assert_eq!(stored.status, PurchaseStatus::Cancelled);
    assert_eq!(stored.settled_at, Some(start() + Duration::hours(2)));
    assert!(h.templates().contains(&"purchase.cancelled".to_string()));
}

#[test]
fn threshold_met_at_deadline_completes() {
    let h = harness();
    let supplier = register(&h.service, Role::Supplier, Plan::Free);
    let purchase = h
        .service
        .create_purchase(&supplier, new_purchase(2, Duration::days(1)))
        .expect("purchase");
    for _ in 0..2 {
        let buyer = register(&h.service, Role::Specialist, Plan::Free);
        h.service
            .join_purchase(&buyer, &purchase.id, 2)
            .expect("joined");
    }

    h.clock.advance(Duration::days(2));
    let late = register(&h.service, Role::Specialist, Plan::Free);
    let err = h
        .service
        .join_purchase(&late, &purchase.id, 1)
        .expect_err("deadline passed");
    assert!(matches!(err, MarketError::IllegalTransition { .. }));

    let summary = h.service.sweep_purchases().expect("sweep");
    assert_eq!(summary.completed, vec![purchase.id.clone()]);
    let stored = h.service.purchase(&purchase.id).expect("purchase");
    assert_eq!(stored.status, PurchaseStatus::Completed);
    assert_eq!(stored.total_volume(), 4);

    let rerun = h.service.sweep_purchases().expect("second sweep");
    assert!(rerun.is_empty());
}

#[test]
fn early_completion_requires_threshold() {
    let h = harness();
    let supplier = register(&h.service, Role::Supplier, Plan::Free);
    let buyer = register(&h.service, Role::Client, Plan::Free);
    let purchase = h
        .service
        .create_purchase(&supplier, new_purchase(1, Duration::days(3)))
        .expect("purchase");

    let err = h
        .service
        .complete_purchase(&supplier, &purchase.id)
        .expect_err("nobody joined yet");
    assert!(matches!(err, MarketError::IllegalTransition { .. }));

    h.service
        .join_purchase(&buyer, &purchase.id, 1)
        .expect("joined");
    let err = h
        .service
        .complete_purchase(&buyer, &purchase.id)
        .expect_err("only the supplier completes");
    assert!(matches!(err, MarketError::Forbidden(_)));

    let completed = h
        .service
        .complete_purchase(&supplier, &purchase.id)
        .expect("completed early");
    assert_eq!(completed.status, PurchaseStatus::Completed);
}

#[test]
fn reads_never_settle_a_purchase() {
    let h = harness();
    let supplier = register(&h.service, Role::Supplier, Plan::Free);
    let purchase = h
        .service
        .create_purchase(&supplier, new_purchase(5, Duration::minutes(30)))
        .expect("purchase");
    h.clock.advance(Duration::hours(1));

    let stored = h.service.purchase(&purchase.id).expect("purchase");
    assert_eq!(stored.status, PurchaseStatus::Active);
    assert!(stored.is_due(h.service.now()));
}

#[tokio::test(start_paused = true)]
async fn sweeper_task_settles_due_purchases_and_stops_on_shutdown() {
    let h = harness();
    let supplier = register(&h.service, Role::Supplier, Plan::Free);
    let purchase = h
        .service
        .create_purchase(&supplier, new_purchase(2, Duration::minutes(5)))
        .expect("purchase");
    h.clock.advance(Duration::minutes(10));

    let (stop, stopped) = oneshot::channel::<()>();
    let task = tokio::spawn(run_purchase_sweeper(
        h.service.clone(),
        StdDuration::from_secs(60),
        async move {
            let _ = stopped.await;
        },
    ));

    tokio::time::sleep(StdDuration::from_secs(61)).await;
    assert_eq!(
        h.service.purchase(&purchase.id).expect("purchase").status,
        PurchaseStatus::Cancelled
    );

    stop.send(()).expect("sweeper still listening");
    task.await.expect("sweeper exits cleanly");
}
