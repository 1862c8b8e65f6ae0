use crate::error::{ApiError, Result};
use sea_orm::{entity::*, query::*, sea_query::Expr, ConnectionTrait, DatabaseTransaction};
use time::OffsetDateTime;
use uuid::Uuid;

/// The slice of the marketplace listing this service is allowed to touch:
/// ownership lookups and the three visibility fields a bump rewrites.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListingService;

impl ListingService {
    pub fn new() -> Self {
        Self
    }

    /// Listing owned by `account_id`. Listings owned by someone else read
    /// as missing.
    pub async fn find_owned<C: ConnectionTrait>(
        &self,
        listing_id: Uuid,
        account_id: Uuid,
        conn: &C,
    ) -> Result<entity::listings::Model> {
        entity::listings::Entity::find_by_id(listing_id)
            .filter(entity::listings::Column::OwnerAccountId.eq(account_id))
            .one(conn)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Listing {} not found", listing_id)))
    }

    /// Same as `find_owned` but holds a row lock until the transaction ends.
    /// Serializes purchases racing on one listing.
    pub async fn lock_owned(
        &self,
        listing_id: Uuid,
        account_id: Uuid,
        txn: &DatabaseTransaction,
    ) -> Result<entity::listings::Model> {
        entity::listings::Entity::find_by_id(listing_id)
            .filter(entity::listings::Column::OwnerAccountId.eq(account_id))
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Listing {} not found", listing_id)))
    }

    /// Write-lock a listing regardless of owner; `None` once it is deleted
    pub async fn lock(
        &self,
        listing_id: Uuid,
        txn: &DatabaseTransaction,
    ) -> Result<Option<entity::listings::Model>> {
        let listing = entity::listings::Entity::find_by_id(listing_id)
            .lock_exclusive()
            .one(txn)
            .await?;

        Ok(listing)
    }

    /// Republish the listing: `published_at = last_bump_at = now`,
    /// `bump_count += 1`. Every failure surfaces as `ListingUpdateFailed`.
    pub async fn touch<C: ConnectionTrait>(
        &self,
        listing_id: Uuid,
        now: OffsetDateTime,
        conn: &C,
    ) -> Result<()> {
        let result = entity::listings::Entity::update_many()
            .col_expr(entity::listings::Column::PublishedAt, Expr::value(now))
            .col_expr(entity::listings::Column::LastBumpAt, Expr::value(Some(now)))
            .col_expr(
                entity::listings::Column::BumpCount,
                Expr::col(entity::listings::Column::BumpCount).add(1),
            )
            .filter(entity::listings::Column::Id.eq(listing_id))
            .exec(conn)
            .await
            .map_err(|e| ApiError::ListingUpdateFailed(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(ApiError::ListingUpdateFailed(format!(
                "listing {} no longer exists",
                listing_id
            )));
        }

        Ok(())
    }
}
