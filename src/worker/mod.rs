//! Background loop that drives due schedule entries through the claim path.
//!
//! Several workers may run against the same database. Correctness comes from
//! `claim_and_resolve`, not from anything held in this process.

use crate::{
    config::WorkerConfig,
    error::Result,
    services::schedule_service::{ClaimOutcome, ScheduleService},
};
use entity::sea_orm_active_enums::BumpTrigger;
use std::{sync::Arc, time::Duration};
use time::OffsetDateTime;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Counters for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub done: usize,
    pub skipped: usize,
    pub failed: usize,
    pub already_resolved: usize,
    pub errors: usize,
    pub purchases_expired: u64,
}

impl TickReport {
    pub fn processed(&self) -> usize {
        self.done + self.skipped + self.failed
    }

    pub fn is_empty(&self) -> bool {
        self.processed() == 0
            && self.already_resolved == 0
            && self.errors == 0
            && self.purchases_expired == 0
    }

    fn record(&mut self, outcome: Result<ClaimOutcome>) {
        match outcome {
            Ok(ClaimOutcome::Done(_)) => self.done += 1,
            Ok(ClaimOutcome::Skipped { .. }) => self.skipped += 1,
            Ok(ClaimOutcome::Failed { .. }) => self.failed += 1,
            Ok(ClaimOutcome::AlreadyResolved { .. }) => self.already_resolved += 1,
            Err(e) => {
                warn!(error = %e, "Claim failed; entry stays pending");
                self.errors += 1;
            }
        }
    }
}

pub struct BumpWorker {
    schedule: Arc<ScheduleService>,
    batch_size: u64,
    tick_interval: Duration,
}

impl BumpWorker {
    pub fn new(schedule: Arc<ScheduleService>, config: &WorkerConfig) -> Self {
        Self {
            schedule,
            batch_size: config.batch_size.max(1),
            tick_interval: Duration::from_secs(config.tick_interval_secs.max(1)),
        }
    }

    /// One pass over the queue as of `now`.
    ///
    /// Due entries of running purchases are bumped first, then due entries
    /// left behind by lapsed purchases are resolved as skipped, then lapsed
    /// purchases are marked expired. A failing entry never stops the batch.
    pub async fn tick(&self, now: OffsetDateTime) -> Result<TickReport> {
        let mut report = TickReport::default();

        for entry in self.schedule.due_entries(now, self.batch_size).await? {
            let outcome = self
                .schedule
                .claim_and_resolve(entry.id, BumpTrigger::Scheduled, now)
                .await;
            report.record(outcome);
        }

        for entry in self.schedule.lapsed_entries(now, self.batch_size).await? {
            let outcome = self
                .schedule
                .claim_and_resolve(entry.id, BumpTrigger::Scheduled, now)
                .await;
            report.record(outcome);
        }

        report.purchases_expired = self.schedule.expire_lapsed_purchases(now).await?;

        if !report.is_empty() {
            info!(
                done = report.done,
                skipped = report.skipped,
                failed = report.failed,
                already_resolved = report.already_resolved,
                errors = report.errors,
                purchases_expired = report.purchases_expired,
                "Worker tick"
            );
        }

        Ok(report)
    }

    /// Tick on a fixed interval until `shutdown` is cancelled
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.tick_interval.as_secs(),
            batch_size = self.batch_size,
            "Bump worker started"
        );

        let mut timer = tokio::time::interval(self.tick_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    if let Err(e) = self.tick(OffsetDateTime::now_utc()).await {
                        error!(error = %e, "Worker tick failed");
                    }
                }
                _ = shutdown.cancelled() => {
                    info!("Bump worker received shutdown signal");
                    break;
                }
            }
        }

        info!("Bump worker stopped");
    }
}
