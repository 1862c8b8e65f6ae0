use crate::common::*;
use bumpline::{services::schedule_planner::window_at, ApiError};
use entity::sea_orm_active_enums::{BumpWindow, PurchaseStatus, ScheduleStatus};
use sea_orm::{entity::*, query::*};
use time::{macros::datetime, Duration, UtcOffset};
use uuid::Uuid;

#[tokio::test]
async fn three_day_purchase_spends_balance_and_plans_one_bump_per_day() {
    let ctx = setup().await;
    let product = seed_flat_product(&ctx.db, BumpWindow::Day, 1, 3, 120).await;
    fund(&ctx.state, ctx.owner, 120).await;

    let receipt = ctx
        .state
        .purchase_service
        .purchase(ctx.owner, ctx.listing_id, &product.code, None, T0)
        .await
        .unwrap();

    assert_eq!(receipt.balance, 0);
    assert_eq!(receipt.scheduled_bumps, 3);
    assert_eq!(receipt.purchase.status, PurchaseStatus::Active);
    assert_eq!(receipt.purchase.expires_at, T0 + Duration::days(3));
    assert_eq!(receipt.purchase.credits_spent, 120);

    let entries = entries_for(&ctx.db, receipt.purchase.id).await;
    assert_eq!(entries.len(), 3);
    let days: Vec<_> = entries.iter().map(|e| e.run_at.date()).collect();
    assert_eq!(
        days,
        vec![
            datetime!(2026-03-03 00:00 UTC).date(),
            datetime!(2026-03-04 00:00 UTC).date(),
            datetime!(2026-03-05 00:00 UTC).date(),
        ]
    );
    for entry in &entries {
        assert_eq!(entry.status, ScheduleStatus::Pending);
        assert_eq!(entry.window, BumpWindow::Day);
        assert_eq!(window_at(entry.run_at, UtcOffset::UTC), BumpWindow::Day);
        assert!(entry.run_at >= T0 && entry.run_at < receipt.purchase.expires_at);
    }

    assert_eq!(ctx.state.ledger_service.balance(ctx.owner).await.unwrap(), 0);
    assert!(ctx.state.ledger_service.reconcile(ctx.owner).await.unwrap());
}

#[tokio::test]
async fn insufficient_funds_creates_nothing() {
    let ctx = setup().await;
    let product = seed_flat_product(&ctx.db, BumpWindow::Day, 1, 3, 120).await;
    fund(&ctx.state, ctx.owner, 50).await;

    let err = ctx
        .state
        .purchase_service
        .purchase(ctx.owner, ctx.listing_id, &product.code, None, T0)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::InsufficientFunds {
            required: 120,
            available: 50
        }
    ));

    assert_eq!(ctx.state.ledger_service.balance(ctx.owner).await.unwrap(), 50);
    let purchases = entity::purchases::Entity::find().all(&ctx.db).await.unwrap();
    assert!(purchases.is_empty());
    let entries = entity::schedule_entries::Entity::find()
        .all(&ctx.db)
        .await
        .unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn entry_count_matches_days_times_cadence() {
    let ctx = setup().await;
    fund(&ctx.state, ctx.owner, 10_000).await;

    let cases = [
        (BumpWindow::Day, 1, 1),
        (BumpWindow::Day, 4, 7),
        (BumpWindow::Night, 3, 5),
        (BumpWindow::Night, 24, 2),
    ];

    for (window, per_window, days) in cases {
        let listing_id = seed_listing(&ctx.db, ctx.owner).await;
        let product = seed_flat_product(&ctx.db, window, per_window, days, 10).await;
        let start = T0 + Duration::minutes(17 * per_window as i64);

        let receipt = ctx
            .state
            .purchase_service
            .purchase(ctx.owner, listing_id, &product.code, None, start)
            .await
            .unwrap();

        let expected = (days * per_window) as usize;
        assert_eq!(receipt.scheduled_bumps, expected);
        let entries = entries_for(&ctx.db, receipt.purchase.id).await;
        assert_eq!(entries.len(), expected);
        assert!(entries.iter().all(|e| e.window == window));
    }
}

#[tokio::test]
async fn per_day_pricing_requires_days_in_range() {
    let ctx = setup().await;
    let product = seed_per_day_product(&ctx.db, 15, 2, 10).await;
    fund(&ctx.state, ctx.owner, 1_000).await;
    let planner = &ctx.state.purchase_service;

    for days in [None, Some(1), Some(11)] {
        let err = planner
            .purchase(ctx.owner, ctx.listing_id, &product.code, days, T0)
            .await
            .unwrap_err();
        assert!(
            matches!(err, ApiError::DaysOutOfRange { min: 2, max: 10, .. }),
            "days={days:?} gave {err:?}"
        );
    }
    assert_eq!(ctx.state.ledger_service.balance(ctx.owner).await.unwrap(), 1_000);

    let receipt = planner
        .purchase(ctx.owner, ctx.listing_id, &product.code, Some(4), T0)
        .await
        .unwrap();
    assert_eq!(receipt.purchase.credits_spent, 60);
    assert_eq!(receipt.purchase.days, 4);
    assert_eq!(receipt.scheduled_bumps, 4);
    assert_eq!(receipt.balance, 940);
}

#[tokio::test]
async fn unknown_or_inactive_product_is_rejected() {
    let ctx = setup().await;
    let product = seed_flat_product(&ctx.db, BumpWindow::Day, 1, 3, 0).await;

    let mut inactive: entity::products::ActiveModel = product.clone().into();
    inactive.active = Set(false);
    inactive.update(&ctx.db).await.unwrap();

    for code in [product.code.as_str(), "does-not-exist"] {
        let err = ctx
            .state
            .purchase_service
            .purchase(ctx.owner, ctx.listing_id, code, None, T0)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidProduct(_)));
    }
}

#[tokio::test]
async fn free_product_writes_no_ledger_entry() {
    let ctx = setup().await;
    let product = seed_flat_product(&ctx.db, BumpWindow::Night, 1, 2, 0).await;

    let receipt = ctx
        .state
        .purchase_service
        .purchase(ctx.owner, ctx.listing_id, &product.code, None, T0)
        .await
        .unwrap();

    assert_eq!(receipt.balance, 0);
    assert_eq!(receipt.scheduled_bumps, 2);
    assert!(ctx
        .state
        .ledger_service
        .history(ctx.owner, 10)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn second_live_purchase_on_listing_conflicts() {
    let ctx = setup().await;
    let product = seed_flat_product(&ctx.db, BumpWindow::Day, 1, 3, 10).await;
    fund(&ctx.state, ctx.owner, 100).await;
    let planner = &ctx.state.purchase_service;

    planner
        .purchase(ctx.owner, ctx.listing_id, &product.code, None, T0)
        .await
        .unwrap();

    let err = planner
        .purchase(
            ctx.owner,
            ctx.listing_id,
            &product.code,
            None,
            T0 + Duration::days(1),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
    assert_eq!(ctx.state.ledger_service.balance(ctx.owner).await.unwrap(), 90);
}

#[tokio::test]
async fn lapsed_purchase_is_replaced() {
    let ctx = setup().await;
    let product = seed_flat_product(&ctx.db, BumpWindow::Day, 1, 3, 10).await;
    fund(&ctx.state, ctx.owner, 100).await;
    let planner = &ctx.state.purchase_service;

    let first = planner
        .purchase(ctx.owner, ctx.listing_id, &product.code, None, T0)
        .await
        .unwrap();
    let second = planner
        .purchase(
            ctx.owner,
            ctx.listing_id,
            &product.code,
            None,
            T0 + Duration::days(4),
        )
        .await
        .unwrap();

    let old = entity::purchases::Entity::find_by_id(first.purchase.id)
        .one(&ctx.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(old.status, PurchaseStatus::Expired);
    assert_eq!(second.purchase.status, PurchaseStatus::Active);
    assert_eq!(second.balance, 80);
}

#[tokio::test]
async fn cannot_buy_for_someone_elses_listing() {
    let ctx = setup().await;
    let product = seed_flat_product(&ctx.db, BumpWindow::Day, 1, 3, 10).await;
    let stranger = Uuid::new_v4();
    fund(&ctx.state, stranger, 100).await;

    let err = ctx
        .state
        .purchase_service
        .purchase(stranger, ctx.listing_id, &product.code, None, T0)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
    assert_eq!(ctx.state.ledger_service.balance(stranger).await.unwrap(), 100);
}

#[tokio::test]
async fn concurrent_purchases_on_one_listing_admit_one() {
    let ctx = setup().await;
    let product = seed_flat_product(&ctx.db, BumpWindow::Day, 2, 3, 10).await;
    fund(&ctx.state, ctx.owner, 100).await;

    let attempts = (0..4).map(|_| {
        let planner = ctx.state.purchase_service.clone();
        let code = product.code.clone();
        let (owner, listing_id) = (ctx.owner, ctx.listing_id);
        async move { planner.purchase(owner, listing_id, &code, None, T0).await }
    });
    let results = futures::future::join_all(attempts).await;

    let ok = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(ApiError::Conflict(_))))
        .count();
    assert_eq!(ok, 1);
    assert_eq!(conflicts, 3);
    assert_eq!(ctx.state.ledger_service.balance(ctx.owner).await.unwrap(), 90);
}
