use crate::common::*;
use bumpline::ApiError;
use entity::sea_orm_active_enums::{BumpTrigger, BumpWindow, ScheduleStatus};
use time::{macros::datetime, Duration};
use uuid::Uuid;

#[tokio::test]
async fn no_pending_entry_means_no_bump() {
    let ctx = setup().await;

    let err = ctx
        .state
        .bump_service
        .bump_now(ctx.listing_id, ctx.owner, T0)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NoBumpAvailable));

    let listing = listing(&ctx.db, ctx.listing_id).await;
    assert_eq!(listing.bump_count, 0);
    assert_eq!(listing.last_bump_at, None);
    assert!(bump_logs(&ctx.db, ctx.listing_id).await.is_empty());
}

#[tokio::test]
async fn prefers_entry_from_current_window() {
    let ctx = setup().await;
    // Day slots of 8h: runs at 10:00 and 18:00
    let product = seed_flat_product(&ctx.db, BumpWindow::Day, 2, 3, 0).await;
    let receipt = ctx
        .state
        .purchase_service
        .purchase(ctx.owner, ctx.listing_id, &product.code, None, T0)
        .await
        .unwrap();
    let entries = entries_for(&ctx.db, receipt.purchase.id).await;
    assert_eq!(entries[0].run_at, datetime!(2026-03-02 18:00 UTC));
    assert_eq!(entries[1].run_at, datetime!(2026-03-03 10:00 UTC));

    let now = datetime!(2026-03-03 12:00 UTC);
    let bump = ctx
        .state
        .bump_service
        .bump_now(ctx.listing_id, ctx.owner, now)
        .await
        .unwrap();
    assert_eq!(bump.entry_id, entries[1].id);
    assert_eq!(bump.bumped_at, now);
    assert_eq!(bump.window, BumpWindow::Day);

    let entries = entries_for(&ctx.db, receipt.purchase.id).await;
    assert_eq!(entries[0].status, ScheduleStatus::Pending);
    assert_eq!(entries[1].status, ScheduleStatus::Done);

    let listing = listing(&ctx.db, ctx.listing_id).await;
    assert_eq!(listing.bump_count, 1);
    assert_eq!(listing.last_bump_at, Some(now));

    let logs = bump_logs(&ctx.db, ctx.listing_id).await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].trigger, BumpTrigger::Manual);
}

#[tokio::test]
async fn falls_back_to_earliest_pending_entry() {
    let ctx = setup().await;
    let product = seed_flat_product(&ctx.db, BumpWindow::Day, 2, 3, 0).await;
    let receipt = ctx
        .state
        .purchase_service
        .purchase(ctx.owner, ctx.listing_id, &product.code, None, T0)
        .await
        .unwrap();
    let first = entries_for(&ctx.db, receipt.purchase.id).await[0].clone();

    // 23:00 is NIGHT; nothing of this DAY product falls in the current window
    let bump = ctx
        .state
        .bump_service
        .bump_now(ctx.listing_id, ctx.owner, datetime!(2026-03-03 23:00 UTC))
        .await
        .unwrap();
    assert_eq!(bump.entry_id, first.id);
    assert_eq!(bump.window, BumpWindow::Day);
}

#[tokio::test]
async fn every_entry_can_be_spent_once() {
    let ctx = setup().await;
    let product = seed_flat_product(&ctx.db, BumpWindow::Night, 1, 2, 0).await;
    ctx.state
        .purchase_service
        .purchase(ctx.owner, ctx.listing_id, &product.code, None, T0)
        .await
        .unwrap();

    let bump = &ctx.state.bump_service;
    let now = T0 + Duration::hours(1);
    bump.bump_now(ctx.listing_id, ctx.owner, now).await.unwrap();
    bump.bump_now(ctx.listing_id, ctx.owner, now).await.unwrap();
    let err = bump
        .bump_now(ctx.listing_id, ctx.owner, now)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NoBumpAvailable));
    assert_eq!(listing(&ctx.db, ctx.listing_id).await.bump_count, 2);
}

#[tokio::test]
async fn paused_placement_cannot_bump() {
    let ctx = setup().await;
    let product = seed_flat_product(&ctx.db, BumpWindow::Day, 1, 3, 0).await;
    ctx.state
        .purchase_service
        .purchase(ctx.owner, ctx.listing_id, &product.code, None, T0)
        .await
        .unwrap();
    ctx.state
        .purchase_service
        .pause(ctx.listing_id, ctx.owner, T0 + Duration::hours(1))
        .await
        .unwrap();

    let err = ctx
        .state
        .bump_service
        .bump_now(ctx.listing_id, ctx.owner, T0 + Duration::hours(2))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NoBumpAvailable));
}

#[tokio::test]
async fn only_the_owner_can_bump() {
    let ctx = setup().await;
    let err = ctx
        .state
        .bump_service
        .bump_now(ctx.listing_id, Uuid::new_v4(), T0)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}
