use crate::common::*;
use bumpline::{config::WorkerConfig, worker::BumpWorker};
use entity::sea_orm_active_enums::{BumpWindow, PurchaseStatus, ScheduleStatus};
use sea_orm::entity::*;
use std::time::Duration as StdDuration;
use time::{macros::datetime, Duration};
use tokio_util::sync::CancellationToken;

fn worker(ctx: &TestContext, batch_size: u64) -> BumpWorker {
    BumpWorker::new(
        ctx.state.schedule_service.clone(),
        &WorkerConfig {
            enabled: true,
            tick_interval_secs: 1,
            batch_size,
        },
    )
}

#[tokio::test]
async fn tick_runs_due_entries_only() {
    let ctx = setup().await;
    let product = seed_flat_product(&ctx.db, BumpWindow::Day, 1, 3, 0).await;
    let receipt = ctx
        .state
        .purchase_service
        .purchase(ctx.owner, ctx.listing_id, &product.code, None, T0)
        .await
        .unwrap();

    // First run is at 14:00 on the 3rd; the second is not due yet
    let report = worker(&ctx, 100)
        .tick(datetime!(2026-03-03 18:00 UTC))
        .await
        .unwrap();
    assert_eq!(report.done, 1);
    assert_eq!(report.processed(), 1);

    assert_eq!(
        count_with_status(&ctx.db, receipt.purchase.id, ScheduleStatus::Done).await,
        1
    );
    assert_eq!(
        count_with_status(&ctx.db, receipt.purchase.id, ScheduleStatus::Pending).await,
        2
    );
    assert_eq!(listing(&ctx.db, ctx.listing_id).await.bump_count, 1);
}

#[tokio::test]
async fn empty_tick_reports_nothing() {
    let ctx = setup().await;
    let report = worker(&ctx, 100).tick(T0).await.unwrap();
    assert!(report.is_empty());
}

#[tokio::test]
async fn batch_size_bounds_each_tick() {
    let ctx = setup().await;
    let product = seed_flat_product(&ctx.db, BumpWindow::Day, 4, 3, 0).await;
    let start = datetime!(2026-03-02 00:00 UTC);
    ctx.state
        .purchase_service
        .purchase(ctx.owner, ctx.listing_id, &product.code, None, start)
        .await
        .unwrap();

    // Eight runs (four on each of the first two days) are due by then
    let now = datetime!(2026-03-03 23:00 UTC);
    let worker = worker(&ctx, 3);

    let mut done = Vec::new();
    for _ in 0..4 {
        done.push(worker.tick(now).await.unwrap().done);
    }
    assert_eq!(done, vec![3, 3, 2, 0]);
    assert_eq!(listing(&ctx.db, ctx.listing_id).await.bump_count, 8);
}

#[tokio::test]
async fn lapsed_purchase_entries_are_swept() {
    let ctx = setup().await;
    let product = seed_flat_product(&ctx.db, BumpWindow::Day, 1, 3, 0).await;
    let receipt = ctx
        .state
        .purchase_service
        .purchase(ctx.owner, ctx.listing_id, &product.code, None, T0)
        .await
        .unwrap();

    let report = worker(&ctx, 100)
        .tick(datetime!(2026-03-06 00:00 UTC))
        .await
        .unwrap();
    assert_eq!(report.done, 0);
    assert_eq!(report.skipped, 3);
    assert_eq!(report.purchases_expired, 1);

    assert_eq!(
        count_with_status(&ctx.db, receipt.purchase.id, ScheduleStatus::Skipped).await,
        3
    );
    let purchase = entity::purchases::Entity::find_by_id(receipt.purchase.id)
        .one(&ctx.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(purchase.status, PurchaseStatus::Expired);
    assert_eq!(listing(&ctx.db, ctx.listing_id).await.bump_count, 0);
    assert!(bump_logs(&ctx.db, ctx.listing_id).await.is_empty());
}

#[tokio::test]
async fn failing_entry_does_not_stop_the_batch() {
    let ctx = setup().await;
    let product = seed_flat_product(&ctx.db, BumpWindow::Day, 1, 2, 0).await;
    let doomed_listing = seed_listing(&ctx.db, ctx.owner).await;

    for listing_id in [doomed_listing, ctx.listing_id] {
        ctx.state
            .purchase_service
            .purchase(ctx.owner, listing_id, &product.code, None, T0)
            .await
            .unwrap();
    }
    entity::listings::Entity::delete_by_id(doomed_listing)
        .exec(&ctx.db)
        .await
        .unwrap();

    let report = worker(&ctx, 100)
        .tick(T0 + Duration::days(1))
        .await
        .unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(report.done, 1);
    assert_eq!(listing(&ctx.db, ctx.listing_id).await.bump_count, 1);

    let failures = bump_logs(&ctx.db, doomed_listing).await;
    assert_eq!(failures.len(), 1);
    assert!(!failures[0].success);
}

#[tokio::test]
async fn paused_entries_wait() {
    let ctx = setup().await;
    let product = seed_flat_product(&ctx.db, BumpWindow::Day, 1, 3, 0).await;
    let receipt = ctx
        .state
        .purchase_service
        .purchase(ctx.owner, ctx.listing_id, &product.code, None, T0)
        .await
        .unwrap();
    ctx.state
        .purchase_service
        .pause(ctx.listing_id, ctx.owner, T0 + Duration::hours(2))
        .await
        .unwrap();

    let report = worker(&ctx, 100)
        .tick(T0 + Duration::days(10))
        .await
        .unwrap();
    assert!(report.is_empty());
    assert_eq!(
        count_with_status(&ctx.db, receipt.purchase.id, ScheduleStatus::Pending).await,
        3
    );
}

#[tokio::test]
async fn run_stops_on_shutdown() {
    let ctx = setup().await;
    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(worker(&ctx, 10).run(shutdown.clone()));

    tokio::time::sleep(StdDuration::from_millis(50)).await;
    shutdown.cancel();

    tokio::time::timeout(StdDuration::from_secs(5), handle)
        .await
        .expect("worker did not stop")
        .expect("worker panicked");
}
