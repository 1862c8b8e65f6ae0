use crate::{
    error::{ApiError, Result},
    services::listing_service::ListingService,
};
use entity::sea_orm_active_enums::BumpTrigger;
use sea_orm::{entity::*, DatabaseTransaction, TransactionTrait};
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

/// Outcome of running one claimed entry's side effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BumpAttempt {
    Succeeded,
    Failed(String),
}

/// Performs the bump for a claimed schedule entry and writes its audit row.
pub struct BumpExecutor {
    listings: ListingService,
}

impl BumpExecutor {
    pub fn new() -> Self {
        Self {
            listings: ListingService::new(),
        }
    }

    /// Touch the listing inside a savepoint so a failed update leaves the
    /// claim transaction usable, then append the BumpLog row for the attempt.
    ///
    /// Errors returned from here abort the whole claim; listing failures do not.
    pub async fn execute(
        &self,
        entry: &entity::schedule_entries::Model,
        trigger: BumpTrigger,
        now: OffsetDateTime,
        txn: &DatabaseTransaction,
    ) -> Result<BumpAttempt> {
        let savepoint = txn.begin().await?;
        let attempt = match self.listings.touch(entry.listing_id, now, &savepoint).await {
            Ok(()) => {
                savepoint.commit().await?;
                BumpAttempt::Succeeded
            }
            Err(err) => {
                savepoint.rollback().await?;
                let message = match err {
                    ApiError::ListingUpdateFailed(message) => message,
                    other => other.to_string(),
                };
                warn!(
                    entry_id = %entry.id,
                    listing_id = %entry.listing_id,
                    error = %message,
                    "Bump side effect failed"
                );
                BumpAttempt::Failed(message)
            }
        };

        let (success, error) = match &attempt {
            BumpAttempt::Succeeded => (true, None),
            BumpAttempt::Failed(message) => (false, Some(message.clone())),
        };

        let log = entity::bump_logs::ActiveModel {
            id: Set(Uuid::now_v7()),
            listing_id: Set(entry.listing_id),
            purchase_id: Set(Some(entry.purchase_id)),
            schedule_entry_id: Set(Some(entry.id)),
            bumped_at: Set(now),
            window: Set(entry.window),
            trigger: Set(trigger),
            success: Set(success),
            error: Set(error),
        };
        entity::bump_logs::Entity::insert(log)
            .exec_without_returning(txn)
            .await?;

        Ok(attempt)
    }
}

impl Default for BumpExecutor {
    fn default() -> Self {
        Self::new()
    }
}
