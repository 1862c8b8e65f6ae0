use crate::common::*;
use bumpline::ApiError;
use entity::sea_orm_active_enums::{BumpWindow, PurchaseStatus, ScheduleStatus};
use time::{macros::datetime, Duration};

#[tokio::test]
async fn pause_banks_unused_whole_days_and_resume_replans() {
    let ctx = setup().await;
    let product = seed_flat_product(&ctx.db, BumpWindow::Day, 1, 5, 0).await;
    let planner = &ctx.state.purchase_service;
    let receipt = planner
        .purchase(ctx.owner, ctx.listing_id, &product.code, None, T0)
        .await
        .unwrap();
    assert_eq!(receipt.scheduled_bumps, 5);

    // Two whole days and three hours in
    let paused = planner
        .pause(ctx.listing_id, ctx.owner, T0 + Duration::hours(51))
        .await
        .unwrap();
    assert_eq!(paused.status, PurchaseStatus::Paused);
    assert_eq!(paused.remaining_days, 3);
    assert_eq!(paused.paused_at, Some(T0 + Duration::hours(51)));
    // Pending entries are left for resume to deal with
    assert_eq!(
        count_with_status(&ctx.db, paused.id, ScheduleStatus::Pending).await,
        5
    );

    let resume_at = datetime!(2026-03-05 10:00 UTC);
    let resumed = planner
        .resume(ctx.listing_id, ctx.owner, resume_at)
        .await
        .unwrap();
    assert_eq!(resumed.status, PurchaseStatus::Active);
    assert_eq!(resumed.expires_at, resume_at + Duration::days(3));
    assert_eq!(resumed.last_resumed_at, resume_at);
    assert_eq!(resumed.paused_at, None);

    let entries = entries_for(&ctx.db, resumed.id).await;
    let pending: Vec<_> = entries
        .iter()
        .filter(|e| e.status == ScheduleStatus::Pending)
        .collect();
    let superseded = entries
        .iter()
        .filter(|e| {
            e.status == ScheduleStatus::Skipped && e.resolution.as_deref() == Some("superseded")
        })
        .count();
    assert_eq!(pending.len(), 3);
    assert_eq!(superseded, 5);
    assert!(pending
        .iter()
        .all(|e| e.run_at >= resume_at && e.run_at < resumed.expires_at));
}

#[tokio::test]
async fn remaining_days_never_grow() {
    let ctx = setup().await;
    let product = seed_flat_product(&ctx.db, BumpWindow::Night, 2, 4, 0).await;
    let planner = &ctx.state.purchase_service;
    planner
        .purchase(ctx.owner, ctx.listing_id, &product.code, None, T0)
        .await
        .unwrap();

    let mut now = T0;
    let mut last_remaining = 4;
    for gap_hours in [5, 30, 0, 49] {
        now += Duration::hours(gap_hours);
        let paused = planner.pause(ctx.listing_id, ctx.owner, now).await.unwrap();
        assert!(paused.remaining_days <= last_remaining);
        last_remaining = paused.remaining_days;
        if last_remaining == 0 {
            break;
        }
        now += Duration::hours(1);
        planner
            .resume(ctx.listing_id, ctx.owner, now)
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn transitions_require_the_right_state() {
    let ctx = setup().await;
    let product = seed_flat_product(&ctx.db, BumpWindow::Day, 1, 3, 0).await;
    let planner = &ctx.state.purchase_service;

    let err = planner
        .pause(ctx.listing_id, ctx.owner, T0)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    planner
        .purchase(ctx.owner, ctx.listing_id, &product.code, None, T0)
        .await
        .unwrap();

    let err = planner
        .resume(ctx.listing_id, ctx.owner, T0 + Duration::hours(1))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::PurchaseNotActive(_)));

    planner
        .pause(ctx.listing_id, ctx.owner, T0 + Duration::hours(1))
        .await
        .unwrap();
    let err = planner
        .pause(ctx.listing_id, ctx.owner, T0 + Duration::hours(2))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::PurchaseNotActive(_)));
}

#[tokio::test]
async fn paused_placement_blocks_new_purchase() {
    let ctx = setup().await;
    let product = seed_flat_product(&ctx.db, BumpWindow::Day, 1, 2, 0).await;
    let planner = &ctx.state.purchase_service;
    planner
        .purchase(ctx.owner, ctx.listing_id, &product.code, None, T0)
        .await
        .unwrap();

    // One minute short of two days counts as one whole day
    let paused = planner
        .pause(
            ctx.listing_id,
            ctx.owner,
            T0 + Duration::days(2) - Duration::minutes(1),
        )
        .await
        .unwrap();
    assert_eq!(paused.remaining_days, 1);

    let product_b = seed_flat_product(&ctx.db, BumpWindow::Day, 1, 1, 0).await;
    let err = planner
        .purchase(
            ctx.owner,
            ctx.listing_id,
            &product_b.code,
            None,
            T0 + Duration::days(3),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));

    let resumed = planner
        .resume(ctx.listing_id, ctx.owner, T0 + Duration::days(4))
        .await
        .unwrap();
    assert_eq!(resumed.expires_at, T0 + Duration::days(5));
}
