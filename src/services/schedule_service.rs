use crate::{
    error::{ApiError, Result},
    models::purchase_ext::PurchaseExt,
    services::{
        bump_executor::{BumpAttempt, BumpExecutor},
        listing_service::ListingService,
        schedule_planner,
    },
};
use entity::sea_orm_active_enums::{BumpTrigger, BumpWindow, PurchaseStatus, ScheduleStatus};
use sea_orm::{
    entity::*, query::*, sea_query::Expr, Condition, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, PaginatorTrait, TransactionTrait,
};
use std::fmt;
use time::{Duration, OffsetDateTime, UtcOffset};
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Why an entry was resolved `SKIPPED` without running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    PurchasePaused,
    PurchaseExpired,
    PurchaseMissing,
    Superseded,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::PurchasePaused => "purchase_paused",
            SkipReason::PurchaseExpired => "purchase_expired",
            SkipReason::PurchaseMissing => "purchase_missing",
            SkipReason::Superseded => "superseded",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolution text stored for entries whose bump side effect failed
pub const LISTING_UPDATE_FAILED: &str = "listing_update_failed";

/// A bump that actually happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BumpReceipt {
    pub entry_id: Uuid,
    pub purchase_id: Uuid,
    pub listing_id: Uuid,
    pub bumped_at: OffsetDateTime,
    pub window: BumpWindow,
}

/// Result of one `claim_and_resolve` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    Done(BumpReceipt),
    Skipped { entry_id: Uuid, reason: SkipReason },
    Failed { entry_id: Uuid, error: String },
    /// Someone else resolved the entry first; nothing was written
    AlreadyResolved { entry_id: Uuid },
}

/// Everything the schedule view shows for one listing
#[derive(Debug, Clone)]
pub struct ScheduleOverview {
    pub purchase: entity::purchases::Model,
    pub entries: Vec<entity::schedule_entries::Model>,
    pub bumps_today: u64,
    pub pending_today: u64,
}

/// Durable queue of schedule entries and the single transition that
/// resolves them.
pub struct ScheduleService {
    db: DatabaseConnection,
    executor: BumpExecutor,
    listings: ListingService,
    offset: UtcOffset,
}

impl ScheduleService {
    pub fn new(db: DatabaseConnection, offset: UtcOffset) -> Self {
        Self {
            db,
            executor: BumpExecutor::new(),
            listings: ListingService::new(),
            offset,
        }
    }

    /// Take ownership of a pending entry and drive it to a terminal state.
    ///
    /// Runs in one transaction: the listing row is write-locked, the purchase
    /// row share-locked, then the entry row is write-locked and re-checked.
    /// A caller that finds the entry already resolved commits nothing and
    /// gets `AlreadyResolved`. Any error rolls the whole claim back, leaving
    /// the entry `PENDING` for a later tick.
    #[instrument(skip(self))]
    pub async fn claim_and_resolve(
        &self,
        entry_id: Uuid,
        trigger: BumpTrigger,
        now: OffsetDateTime,
    ) -> Result<ClaimOutcome> {
        let now = now.to_offset(UtcOffset::UTC);
        let txn = self.db.begin().await?;

        // Listing, then purchase, then entry: the order purchase, pause and
        // resume lock in
        let peek = entity::schedule_entries::Entity::find_by_id(entry_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Schedule entry {} not found", entry_id)))?;

        self.listings.lock(peek.listing_id, &txn).await?;

        let purchase = entity::purchases::Entity::find_by_id(peek.purchase_id)
            .lock_shared()
            .one(&txn)
            .await?;

        let entry = entity::schedule_entries::Entity::find_by_id(entry_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Schedule entry {} not found", entry_id)))?;

        if entry.status != ScheduleStatus::Pending {
            txn.commit().await?;
            debug!(entry_id = %entry_id, status = ?entry.status, "Entry already resolved");
            return Ok(ClaimOutcome::AlreadyResolved { entry_id });
        }

        let skip = match &purchase {
            None => Some(SkipReason::PurchaseMissing),
            Some(p) if p.status == PurchaseStatus::Paused => Some(SkipReason::PurchasePaused),
            Some(p) if !p.is_running(now) => Some(SkipReason::PurchaseExpired),
            Some(_) => None,
        };

        if let Some(reason) = skip {
            if !resolve(&entry, ScheduleStatus::Skipped, None, Some(reason.as_str()), &txn).await? {
                return Ok(ClaimOutcome::AlreadyResolved { entry_id });
            }
            txn.commit().await?;
            info!(
                entry_id = %entry_id,
                purchase_id = %entry.purchase_id,
                reason = %reason,
                "Skipped schedule entry"
            );
            return Ok(ClaimOutcome::Skipped { entry_id, reason });
        }

        let attempt = self.executor.execute(&entry, trigger, now, &txn).await?;
        let outcome = match attempt {
            BumpAttempt::Succeeded => {
                if !resolve(&entry, ScheduleStatus::Done, Some(now), None, &txn).await? {
                    return Ok(ClaimOutcome::AlreadyResolved { entry_id });
                }
                ClaimOutcome::Done(BumpReceipt {
                    entry_id,
                    purchase_id: entry.purchase_id,
                    listing_id: entry.listing_id,
                    bumped_at: now,
                    window: entry.window,
                })
            }
            BumpAttempt::Failed(error) => {
                if !resolve(
                    &entry,
                    ScheduleStatus::Skipped,
                    Some(now),
                    Some(LISTING_UPDATE_FAILED),
                    &txn,
                )
                .await?
                {
                    return Ok(ClaimOutcome::AlreadyResolved { entry_id });
                }
                ClaimOutcome::Failed { entry_id, error }
            }
        };
        txn.commit().await?;

        if let ClaimOutcome::Done(receipt) = &outcome {
            info!(
                entry_id = %entry_id,
                listing_id = %receipt.listing_id,
                trigger = ?trigger,
                "Bumped listing"
            );
        }

        Ok(outcome)
    }

    /// Due entries whose purchase is still running, oldest first
    pub async fn due_entries(
        &self,
        now: OffsetDateTime,
        limit: u64,
    ) -> Result<Vec<entity::schedule_entries::Model>> {
        let now = now.to_offset(UtcOffset::UTC);
        let entries = entity::schedule_entries::Entity::find()
            .inner_join(entity::purchases::Entity)
            .filter(entity::schedule_entries::Column::Status.eq(ScheduleStatus::Pending))
            .filter(entity::schedule_entries::Column::RunAt.lte(now))
            .filter(entity::purchases::Column::Status.eq(PurchaseStatus::Active))
            .filter(entity::purchases::Column::ExpiresAt.gt(now))
            .order_by_asc(entity::schedule_entries::Column::RunAt)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok(entries)
    }

    /// Due entries left behind by purchases that ran out. Paused purchases
    /// are excluded; their entries wait for resume.
    pub async fn lapsed_entries(
        &self,
        now: OffsetDateTime,
        limit: u64,
    ) -> Result<Vec<entity::schedule_entries::Model>> {
        let now = now.to_offset(UtcOffset::UTC);
        let entries = entity::schedule_entries::Entity::find()
            .inner_join(entity::purchases::Entity)
            .filter(entity::schedule_entries::Column::Status.eq(ScheduleStatus::Pending))
            .filter(entity::schedule_entries::Column::RunAt.lte(now))
            .filter(
                Condition::any()
                    .add(entity::purchases::Column::Status.eq(PurchaseStatus::Expired))
                    .add(
                        Condition::all()
                            .add(entity::purchases::Column::Status.eq(PurchaseStatus::Active))
                            .add(entity::purchases::Column::ExpiresAt.lte(now)),
                    ),
            )
            .order_by_asc(entity::schedule_entries::Column::RunAt)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok(entries)
    }

    /// Flip ACTIVE purchases past their expiry to EXPIRED
    pub async fn expire_lapsed_purchases(&self, now: OffsetDateTime) -> Result<u64> {
        let now = now.to_offset(UtcOffset::UTC);
        let result = entity::purchases::Entity::update_many()
            .col_expr(
                entity::purchases::Column::Status,
                Expr::value(PurchaseStatus::Expired),
            )
            .col_expr(entity::purchases::Column::UpdatedAt, Expr::value(now))
            .filter(entity::purchases::Column::Status.eq(PurchaseStatus::Active))
            .filter(entity::purchases::Column::ExpiresAt.lte(now))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }

    /// Pending entries for the listing's current placement plus today's counters
    #[instrument(skip(self))]
    pub async fn upcoming(
        &self,
        listing_id: Uuid,
        account_id: Uuid,
        now: OffsetDateTime,
    ) -> Result<ScheduleOverview> {
        let now = now.to_offset(UtcOffset::UTC);
        self.listings
            .find_owned(listing_id, account_id, &self.db)
            .await?;

        let purchase = current_purchase(listing_id, &self.db)
            .await?
            .ok_or_else(|| {
                ApiError::NotFound(format!("Listing {} has no active placement", listing_id))
            })?;

        let entries = entity::schedule_entries::Entity::find()
            .filter(entity::schedule_entries::Column::PurchaseId.eq(purchase.id))
            .filter(entity::schedule_entries::Column::Status.eq(ScheduleStatus::Pending))
            .order_by_asc(entity::schedule_entries::Column::RunAt)
            .all(&self.db)
            .await?;

        let midnight = schedule_planner::local_midnight(now, self.offset);
        let next_midnight = midnight + Duration::days(1);

        let bumps_today = entity::bump_logs::Entity::find()
            .filter(entity::bump_logs::Column::ListingId.eq(listing_id))
            .filter(entity::bump_logs::Column::Success.eq(true))
            .filter(entity::bump_logs::Column::BumpedAt.gte(midnight))
            .count(&self.db)
            .await?;

        let pending_today = entries
            .iter()
            .filter(|e| e.run_at < next_midnight)
            .count() as u64;

        Ok(ScheduleOverview {
            purchase,
            entries,
            bumps_today,
            pending_today,
        })
    }

    /// Recent bump attempts for a listing, newest first
    pub async fn history(
        &self,
        listing_id: Uuid,
        account_id: Uuid,
        limit: u64,
    ) -> Result<Vec<entity::bump_logs::Model>> {
        self.listings
            .find_owned(listing_id, account_id, &self.db)
            .await?;

        let logs = entity::bump_logs::Entity::find()
            .filter(entity::bump_logs::Column::ListingId.eq(listing_id))
            .order_by_desc(entity::bump_logs::Column::BumpedAt)
            .order_by_desc(entity::bump_logs::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok(logs)
    }
}

/// Newest ACTIVE or PAUSED purchase of a listing, lapsed or not
pub async fn current_purchase<C: ConnectionTrait>(
    listing_id: Uuid,
    conn: &C,
) -> Result<Option<entity::purchases::Model>> {
    let purchase = entity::purchases::Entity::find()
        .filter(entity::purchases::Column::ListingId.eq(listing_id))
        .filter(
            entity::purchases::Column::Status
                .is_in([PurchaseStatus::Active, PurchaseStatus::Paused]),
        )
        .order_by_desc(entity::purchases::Column::CreatedAt)
        .one(conn)
        .await?;

    Ok(purchase)
}

/// Conditional PENDING -> terminal write. Returns false if the row was no
/// longer pending.
async fn resolve(
    entry: &entity::schedule_entries::Model,
    status: ScheduleStatus,
    executed_at: Option<OffsetDateTime>,
    resolution: Option<&str>,
    txn: &DatabaseTransaction,
) -> Result<bool> {
    let result = entity::schedule_entries::Entity::update_many()
        .col_expr(entity::schedule_entries::Column::Status, Expr::value(status))
        .col_expr(
            entity::schedule_entries::Column::ExecutedAt,
            Expr::value(executed_at),
        )
        .col_expr(
            entity::schedule_entries::Column::Resolution,
            Expr::value(resolution.map(str::to_string)),
        )
        .filter(entity::schedule_entries::Column::Id.eq(entry.id))
        .filter(entity::schedule_entries::Column::Status.eq(ScheduleStatus::Pending))
        .exec(txn)
        .await?;

    Ok(result.rows_affected == 1)
}
