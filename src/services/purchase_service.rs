use crate::{
    error::{ApiError, Result},
    models::{product_ext::ProductExt, purchase_ext::PurchaseExt},
    services::{
        catalog_service::CatalogService,
        ledger_service::LedgerService,
        listing_service::ListingService,
        schedule_planner::{self, PlannedRun},
        schedule_service::{current_purchase, SkipReason},
    },
};
use entity::sea_orm_active_enums::{LedgerKind, PurchaseStatus, ScheduleStatus};
use sea_orm::{
    entity::*, query::*, sea_query::Expr, DatabaseConnection, DatabaseTransaction,
    TransactionTrait,
};
use time::{Duration, OffsetDateTime, UtcOffset};
use tracing::{info, instrument};
use uuid::Uuid;

/// Upper bound on bumps per window occurrence
pub const MAX_QUANTITY_PER_WINDOW: i32 = 24;

/// Postgres caps bind parameters per statement; keep bulk inserts well below it
const ENTRY_INSERT_CHUNK: usize = 500;

/// What a successful purchase produced
#[derive(Debug, Clone)]
pub struct PurchaseReceipt {
    pub purchase: entity::purchases::Model,
    pub balance: i32,
    pub scheduled_bumps: usize,
}

/// Turns a product choice into a paid purchase and its concrete schedule,
/// and owns the pause/resume transitions.
pub struct PurchaseService {
    db: DatabaseConnection,
    ledger: LedgerService,
    catalog: CatalogService,
    listings: ListingService,
    offset: UtcOffset,
}

impl PurchaseService {
    pub fn new(db: DatabaseConnection, offset: UtcOffset) -> Self {
        Self {
            ledger: LedgerService::new(db.clone()),
            catalog: CatalogService::new(db.clone()),
            listings: ListingService::new(),
            db,
            offset,
        }
    }

    /// Buy a placement: debit, purchase row and schedule entries commit
    /// together or not at all.
    #[instrument(skip(self))]
    pub async fn purchase(
        &self,
        account_id: Uuid,
        listing_id: Uuid,
        product_code: &str,
        requested_days: Option<i32>,
        now: OffsetDateTime,
    ) -> Result<PurchaseReceipt> {
        let now = now.to_offset(UtcOffset::UTC);

        let txn = self.db.begin().await?;

        // Validation happens before anything is written
        let product = self.catalog.lock_active(product_code, &txn).await?;
        let quote = product.quote(requested_days)?;
        if !(1..=MAX_QUANTITY_PER_WINDOW).contains(&product.quantity_per_window) {
            return Err(ApiError::InvalidProduct(format!(
                "Product {} has unsupported cadence of {} per window",
                product.code, product.quantity_per_window
            )));
        }

        self.listings
            .lock_owned(listing_id, account_id, &txn)
            .await?;

        if let Some(prior) = current_purchase(listing_id, &txn).await? {
            if prior.is_live(now) {
                return Err(ApiError::Conflict(format!(
                    "Listing {} already has a {:?} placement until {}",
                    listing_id, prior.status, prior.expires_at
                )));
            }
            expire_purchase(prior.id, now, &txn).await?;
        }

        let purchase_id = Uuid::new_v4();
        let balance = if quote.cost > 0 {
            self.ledger
                .debit_in_txn(
                    account_id,
                    quote.cost,
                    LedgerKind::Spend,
                    &format!("purchase:{}", purchase_id),
                    &txn,
                )
                .await?
                .balance
        } else {
            self.ledger.balance_on(account_id, &txn).await?
        };

        let purchase = entity::purchases::ActiveModel {
            id: Set(purchase_id),
            listing_id: Set(listing_id),
            account_id: Set(account_id),
            product_id: Set(product.id),
            product_code: Set(product.code.clone()),
            window_type: Set(product.window_type),
            quantity_per_window: Set(product.quantity_per_window),
            days: Set(quote.days),
            credits_spent: Set(quote.cost),
            status: Set(PurchaseStatus::Active),
            started_at: Set(now),
            last_resumed_at: Set(now),
            expires_at: Set(now + Duration::days(i64::from(quote.days))),
            remaining_days: Set(quote.days),
            paused_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let runs = self.plan(&purchase, now, quote.days);
        let scheduled_bumps = insert_entries(&purchase, &runs, now, &txn).await?;

        txn.commit().await?;

        info!(
            purchase_id = %purchase.id,
            listing_id = %listing_id,
            account_id = %account_id,
            product = %purchase.product_code,
            days = quote.days,
            credits = quote.cost,
            scheduled_bumps,
            "Placement purchased"
        );

        Ok(PurchaseReceipt {
            purchase,
            balance,
            scheduled_bumps,
        })
    }

    /// Freeze the placement, banking the whole days not yet consumed
    #[instrument(skip(self))]
    pub async fn pause(
        &self,
        listing_id: Uuid,
        account_id: Uuid,
        now: OffsetDateTime,
    ) -> Result<entity::purchases::Model> {
        let now = now.to_offset(UtcOffset::UTC);
        let txn = self.db.begin().await?;

        let purchase = self.lock_current(listing_id, account_id, &txn).await?;
        if purchase.status != PurchaseStatus::Active {
            return Err(ApiError::PurchaseNotActive(
                "Placement is already paused".to_string(),
            ));
        }
        if !purchase.is_running(now) {
            return Err(ApiError::PurchaseNotActive(
                "Placement has expired".to_string(),
            ));
        }

        let remaining = (purchase.remaining_days - purchase.elapsed_days(now)).max(0);

        let mut active: entity::purchases::ActiveModel = purchase.into();
        active.status = Set(PurchaseStatus::Paused);
        active.remaining_days = Set(remaining);
        active.paused_at = Set(Some(now));
        active.updated_at = Set(now);
        let paused = active.update(&txn).await?;

        txn.commit().await?;

        info!(
            purchase_id = %paused.id,
            listing_id = %listing_id,
            remaining_days = remaining,
            "Placement paused"
        );

        Ok(paused)
    }

    /// Restart a paused placement from `now` for its banked days, replacing
    /// whatever was still pending with a fresh schedule
    #[instrument(skip(self))]
    pub async fn resume(
        &self,
        listing_id: Uuid,
        account_id: Uuid,
        now: OffsetDateTime,
    ) -> Result<entity::purchases::Model> {
        let now = now.to_offset(UtcOffset::UTC);
        let txn = self.db.begin().await?;

        let purchase = self.lock_current(listing_id, account_id, &txn).await?;
        if purchase.status != PurchaseStatus::Paused {
            return Err(ApiError::PurchaseNotActive(
                "Placement is not paused".to_string(),
            ));
        }
        if purchase.remaining_days <= 0 {
            return Err(ApiError::PurchaseNotActive(
                "Placement has no days left".to_string(),
            ));
        }

        let superseded = entity::schedule_entries::Entity::update_many()
            .col_expr(
                entity::schedule_entries::Column::Status,
                Expr::value(ScheduleStatus::Skipped),
            )
            .col_expr(
                entity::schedule_entries::Column::Resolution,
                Expr::value(Some(SkipReason::Superseded.as_str().to_string())),
            )
            .filter(entity::schedule_entries::Column::PurchaseId.eq(purchase.id))
            .filter(entity::schedule_entries::Column::Status.eq(ScheduleStatus::Pending))
            .exec(&txn)
            .await?
            .rows_affected;

        let remaining = purchase.remaining_days;
        let mut active: entity::purchases::ActiveModel = purchase.into();
        active.status = Set(PurchaseStatus::Active);
        active.last_resumed_at = Set(now);
        active.expires_at = Set(now + Duration::days(i64::from(remaining)));
        active.paused_at = Set(None);
        active.updated_at = Set(now);
        let resumed = active.update(&txn).await?;

        let runs = self.plan(&resumed, now, remaining);
        let scheduled = insert_entries(&resumed, &runs, now, &txn).await?;

        txn.commit().await?;

        info!(
            purchase_id = %resumed.id,
            listing_id = %listing_id,
            remaining_days = remaining,
            superseded,
            scheduled,
            "Placement resumed"
        );

        Ok(resumed)
    }

    fn plan(
        &self,
        purchase: &entity::purchases::Model,
        from: OffsetDateTime,
        days: i32,
    ) -> Vec<PlannedRun> {
        schedule_planner::plan_runs(
            from,
            days.max(0) as u32,
            purchase.window_type,
            purchase.quantity_per_window.max(0) as u32,
            self.offset,
        )
    }

    /// Write-lock the owned listing, then its current placement
    async fn lock_current(
        &self,
        listing_id: Uuid,
        account_id: Uuid,
        txn: &DatabaseTransaction,
    ) -> Result<entity::purchases::Model> {
        self.listings
            .lock_owned(listing_id, account_id, txn)
            .await?;

        entity::purchases::Entity::find()
            .filter(entity::purchases::Column::ListingId.eq(listing_id))
            .filter(
                entity::purchases::Column::Status
                    .is_in([PurchaseStatus::Active, PurchaseStatus::Paused]),
            )
            .order_by_desc(entity::purchases::Column::CreatedAt)
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or_else(|| {
                ApiError::NotFound(format!("Listing {} has no placement", listing_id))
            })
    }
}

async fn expire_purchase(
    purchase_id: Uuid,
    now: OffsetDateTime,
    txn: &DatabaseTransaction,
) -> Result<()> {
    entity::purchases::Entity::update_many()
        .col_expr(
            entity::purchases::Column::Status,
            Expr::value(PurchaseStatus::Expired),
        )
        .col_expr(entity::purchases::Column::UpdatedAt, Expr::value(now))
        .filter(entity::purchases::Column::Id.eq(purchase_id))
        .exec(txn)
        .await?;

    Ok(())
}

async fn insert_entries(
    purchase: &entity::purchases::Model,
    runs: &[PlannedRun],
    now: OffsetDateTime,
    txn: &DatabaseTransaction,
) -> Result<usize> {
    for chunk in runs.chunks(ENTRY_INSERT_CHUNK) {
        let rows = chunk.iter().map(|run| entity::schedule_entries::ActiveModel {
            id: Set(Uuid::new_v4()),
            purchase_id: Set(purchase.id),
            listing_id: Set(purchase.listing_id),
            run_at: Set(run.run_at),
            window: Set(run.window),
            status: Set(ScheduleStatus::Pending),
            executed_at: Set(None),
            resolution: Set(None),
            created_at: Set(now),
        });
        entity::schedule_entries::Entity::insert_many(rows)
            .exec_without_returning(txn)
            .await?;
    }

    Ok(runs.len())
}
