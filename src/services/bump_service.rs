use crate::{
    error::{ApiError, Result},
    services::{
        listing_service::ListingService,
        schedule_planner,
        schedule_service::{BumpReceipt, ClaimOutcome, ScheduleService},
    },
};
use entity::sea_orm_active_enums::{BumpTrigger, PurchaseStatus, ScheduleStatus};
use sea_orm::{entity::*, query::*, DatabaseConnection, Select};
use std::sync::Arc;
use time::{OffsetDateTime, UtcOffset};
use tracing::{debug, instrument};
use uuid::Uuid;

/// Selection is retried this many times when another caller wins the claim
const MAX_CLAIM_ATTEMPTS: usize = 3;

/// "Bump now": spends one pending entry immediately through the same claim
/// path the worker uses.
pub struct BumpService {
    db: DatabaseConnection,
    schedule: Arc<ScheduleService>,
    listings: ListingService,
    offset: UtcOffset,
}

impl BumpService {
    pub fn new(db: DatabaseConnection, schedule: Arc<ScheduleService>, offset: UtcOffset) -> Self {
        Self {
            db,
            schedule,
            listings: ListingService::new(),
            offset,
        }
    }

    #[instrument(skip(self))]
    pub async fn bump_now(
        &self,
        listing_id: Uuid,
        account_id: Uuid,
        now: OffsetDateTime,
    ) -> Result<BumpReceipt> {
        let now = now.to_offset(UtcOffset::UTC);
        self.listings
            .find_owned(listing_id, account_id, &self.db)
            .await?;

        for attempt in 1..=MAX_CLAIM_ATTEMPTS {
            let entry = self
                .pick_entry(listing_id, now)
                .await?
                .ok_or(ApiError::NoBumpAvailable)?;

            match self
                .schedule
                .claim_and_resolve(entry.id, BumpTrigger::Manual, now)
                .await?
            {
                ClaimOutcome::Done(receipt) => return Ok(receipt),
                ClaimOutcome::Skipped { reason, .. } => {
                    return Err(ApiError::PurchaseNotActive(reason.to_string()))
                }
                ClaimOutcome::Failed { error, .. } => {
                    return Err(ApiError::ListingUpdateFailed(error))
                }
                ClaimOutcome::AlreadyResolved { entry_id } => {
                    debug!(entry_id = %entry_id, attempt, "Lost claim race, reselecting");
                }
            }
        }

        Err(ApiError::NoBumpAvailable)
    }

    /// Earliest pending entry of a running purchase, preferring one planned
    /// for the window occurrence we are in right now
    async fn pick_entry(
        &self,
        listing_id: Uuid,
        now: OffsetDateTime,
    ) -> Result<Option<entity::schedule_entries::Model>> {
        let (window, opens_at, closes_at) = schedule_planner::current_occurrence(now, self.offset);

        let in_window = self
            .eligible(listing_id, now)
            .filter(entity::schedule_entries::Column::Window.eq(window))
            .filter(entity::schedule_entries::Column::RunAt.gte(opens_at))
            .filter(entity::schedule_entries::Column::RunAt.lt(closes_at))
            .one(&self.db)
            .await?;
        if in_window.is_some() {
            return Ok(in_window);
        }

        let any = self.eligible(listing_id, now).one(&self.db).await?;
        Ok(any)
    }

    fn eligible(
        &self,
        listing_id: Uuid,
        now: OffsetDateTime,
    ) -> Select<entity::schedule_entries::Entity> {
        entity::schedule_entries::Entity::find()
            .inner_join(entity::purchases::Entity)
            .filter(entity::schedule_entries::Column::ListingId.eq(listing_id))
            .filter(entity::schedule_entries::Column::Status.eq(ScheduleStatus::Pending))
            .filter(entity::purchases::Column::Status.eq(PurchaseStatus::Active))
            .filter(entity::purchases::Column::ExpiresAt.gt(now))
            .order_by_asc(entity::schedule_entries::Column::RunAt)
    }
}
