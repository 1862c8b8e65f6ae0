use crate::common::*;
use bumpline::ApiError;
use entity::sea_orm_active_enums::LedgerKind;
use std::sync::Arc;
use tokio::task::JoinSet;
use uuid::Uuid;

#[tokio::test]
async fn balance_tracks_sum_of_entries() {
    let ctx = setup().await;
    let ledger = &ctx.state.ledger_service;
    let account = Uuid::new_v4();

    ledger
        .credit(account, 200, LedgerKind::Purchase, "pay-1")
        .await
        .unwrap();
    ledger
        .debit(account, 45, LedgerKind::Spend, "spend-1")
        .await
        .unwrap();
    let posting = ledger.adjust(account, -5, "support-fix").await.unwrap();

    assert_eq!(posting.balance, 150);
    assert_eq!(ledger.balance(account).await.unwrap(), 150);
    assert!(ledger.reconcile(account).await.unwrap());

    let history = ledger.history(account, 10).await.unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history.iter().map(|e| e.amount).sum::<i32>(), 150);
}

#[tokio::test]
async fn overdraft_leaves_no_trace() {
    let ctx = setup().await;
    let ledger = &ctx.state.ledger_service;
    let account = Uuid::new_v4();

    ledger
        .credit(account, 50, LedgerKind::Purchase, "pay-1")
        .await
        .unwrap();

    let err = ledger
        .debit(account, 120, LedgerKind::Spend, "too-much")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::InsufficientFunds {
            required: 120,
            available: 50
        }
    ));

    let err = ledger.adjust(account, -51, "too-much").await.unwrap_err();
    assert!(matches!(err, ApiError::InsufficientFunds { .. }));

    assert_eq!(ledger.balance(account).await.unwrap(), 50);
    assert_eq!(ledger.history(account, 10).await.unwrap().len(), 1);
    assert!(ledger.reconcile(account).await.unwrap());
}

#[tokio::test]
async fn rejects_non_positive_amounts() {
    let ctx = setup().await;
    let ledger = &ctx.state.ledger_service;
    let account = Uuid::new_v4();

    assert!(matches!(
        ledger.credit(account, 0, LedgerKind::Purchase, "x").await,
        Err(ApiError::BadRequest(_))
    ));
    assert!(matches!(
        ledger.debit(account, -3, LedgerKind::Spend, "x").await,
        Err(ApiError::BadRequest(_))
    ));
    assert!(matches!(
        ledger.adjust(account, 0, "x").await,
        Err(ApiError::BadRequest(_))
    ));
    assert_eq!(ledger.balance(account).await.unwrap(), 0);
}

#[tokio::test]
async fn concurrent_debits_never_overdraw() {
    let ctx = setup().await;
    let ledger = ctx.state.ledger_service.clone();
    let account = Uuid::new_v4();

    ledger
        .credit(account, 100, LedgerKind::Purchase, "pay-1")
        .await
        .unwrap();

    let mut tasks = JoinSet::new();
    for i in 0..10 {
        let ledger = Arc::clone(&ledger);
        tasks.spawn(async move {
            ledger
                .debit(account, 30, LedgerKind::Spend, &format!("spend-{}", i))
                .await
        });
    }

    let mut succeeded = 0;
    let mut insufficient = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined.expect("task panicked") {
            Ok(_) => succeeded += 1,
            Err(ApiError::InsufficientFunds { .. }) => insufficient += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(succeeded, 3);
    assert_eq!(insufficient, 7);
    assert_eq!(ledger.balance(account).await.unwrap(), 10);
    assert!(ledger.reconcile(account).await.unwrap());
}
