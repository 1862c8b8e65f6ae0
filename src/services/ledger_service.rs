use crate::error::{ApiError, Result};
use entity::sea_orm_active_enums::LedgerKind;
use sea_orm::{
    entity::*, query::*, sea_query::OnConflict, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, TransactionTrait,
};
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

/// Wallet ledger: balance snapshot plus append-only entries, always written
/// together in one transaction.
pub struct LedgerService {
    db: DatabaseConnection,
}

/// Result of one balance mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerPosting {
    pub entry_id: Uuid,
    pub account_id: Uuid,
    pub amount: i32,
    pub balance: i32,
}

impl LedgerService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Add credits to an account
    #[instrument(skip(self))]
    pub async fn credit(
        &self,
        account_id: Uuid,
        amount: i32,
        kind: LedgerKind,
        reference: &str,
    ) -> Result<LedgerPosting> {
        if amount <= 0 {
            return Err(ApiError::BadRequest(format!(
                "Credit amount must be positive, got {}",
                amount
            )));
        }

        let txn = self.db.begin().await?;
        let posting = self
            .post_in_txn(account_id, amount, kind, reference, &txn)
            .await?;
        txn.commit().await?;

        info!(
            account_id = %account_id,
            amount,
            balance = posting.balance,
            "Credited account"
        );

        Ok(posting)
    }

    /// Remove credits from an account; fails with `InsufficientFunds` and
    /// leaves no trace if the balance would go negative
    #[instrument(skip(self))]
    pub async fn debit(
        &self,
        account_id: Uuid,
        amount: i32,
        kind: LedgerKind,
        reference: &str,
    ) -> Result<LedgerPosting> {
        let txn = self.db.begin().await?;
        let posting = self
            .debit_in_txn(account_id, amount, kind, reference, &txn)
            .await?;
        txn.commit().await?;

        info!(
            account_id = %account_id,
            amount,
            balance = posting.balance,
            "Debited account"
        );

        Ok(posting)
    }

    /// Debit within an existing transaction.
    /// Used by the purchase planner so the spend and the schedule commit together.
    pub async fn debit_in_txn(
        &self,
        account_id: Uuid,
        amount: i32,
        kind: LedgerKind,
        reference: &str,
        txn: &DatabaseTransaction,
    ) -> Result<LedgerPosting> {
        if amount <= 0 {
            return Err(ApiError::BadRequest(format!(
                "Debit amount must be positive, got {}",
                amount
            )));
        }

        self.post_in_txn(account_id, -amount, kind, reference, txn)
            .await
    }

    /// Signed administrative correction
    #[instrument(skip(self))]
    pub async fn adjust(&self, account_id: Uuid, amount: i32, reference: &str) -> Result<LedgerPosting> {
        if amount == 0 {
            return Err(ApiError::BadRequest(
                "Adjustment amount must be non-zero".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        let posting = self
            .post_in_txn(account_id, amount, LedgerKind::Adjust, reference, &txn)
            .await?;
        txn.commit().await?;

        info!(
            account_id = %account_id,
            amount,
            balance = posting.balance,
            reference,
            "Adjusted account balance"
        );

        Ok(posting)
    }

    /// Current balance; accounts that were never touched read as zero
    pub async fn balance(&self, account_id: Uuid) -> Result<i32> {
        self.balance_on(account_id, &self.db).await
    }

    /// Balance read through a caller-supplied connection or transaction
    pub async fn balance_on<C: ConnectionTrait>(&self, account_id: Uuid, conn: &C) -> Result<i32> {
        let account = entity::accounts::Entity::find_by_id(account_id)
            .one(conn)
            .await?;

        Ok(account.map(|a| a.balance).unwrap_or(0))
    }

    /// Most recent ledger entries, newest first
    pub async fn history(
        &self,
        account_id: Uuid,
        limit: u64,
    ) -> Result<Vec<entity::ledger_entries::Model>> {
        let entries = entity::ledger_entries::Entity::find()
            .filter(entity::ledger_entries::Column::AccountId.eq(account_id))
            .order_by_desc(entity::ledger_entries::Column::CreatedAt)
            .order_by_desc(entity::ledger_entries::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok(entries)
    }

    /// Whether the balance snapshot equals the sum of ledger entries
    #[instrument(skip(self))]
    pub async fn reconcile(&self, account_id: Uuid) -> Result<bool> {
        let balance = self.balance(account_id).await?;

        let total = entity::ledger_entries::Entity::find()
            .filter(entity::ledger_entries::Column::AccountId.eq(account_id))
            .select_only()
            .column_as(entity::ledger_entries::Column::Amount.sum(), "total")
            .into_tuple::<Option<i64>>()
            .one(&self.db)
            .await?
            .flatten()
            .unwrap_or(0);

        if total != i64::from(balance) {
            tracing::warn!(
                account_id = %account_id,
                balance,
                ledger_total = total,
                "Ledger does not reconcile with balance"
            );
        }

        Ok(total == i64::from(balance))
    }

    /// Apply a signed delta: lock the account row, check the floor, update
    /// the snapshot and append the entry
    async fn post_in_txn(
        &self,
        account_id: Uuid,
        delta: i32,
        kind: LedgerKind,
        reference: &str,
        txn: &DatabaseTransaction,
    ) -> Result<LedgerPosting> {
        let now = OffsetDateTime::now_utc();
        let account = self.find_and_lock_account(account_id, now, txn).await?;

        let new_balance = account
            .balance
            .checked_add(delta)
            .ok_or_else(|| ApiError::BadRequest("Balance overflow".to_string()))?;

        if new_balance < 0 {
            return Err(ApiError::InsufficientFunds {
                required: -delta,
                available: account.balance,
            });
        }

        let mut account_active: entity::accounts::ActiveModel = account.into();
        account_active.balance = Set(new_balance);
        account_active.updated_at = Set(now);
        account_active.update(txn).await?;

        let entry_id = Uuid::now_v7();
        let entry = entity::ledger_entries::ActiveModel {
            id: Set(entry_id),
            account_id: Set(account_id),
            amount: Set(delta),
            kind: Set(kind),
            reference: Set(reference.to_string()),
            created_at: Set(now),
        };
        entity::ledger_entries::Entity::insert(entry)
            .exec_without_returning(txn)
            .await?;

        Ok(LedgerPosting {
            entry_id,
            account_id,
            amount: delta,
            balance: new_balance,
        })
    }

    /// Lock the account row for update, creating it at zero on first use
    async fn find_and_lock_account(
        &self,
        account_id: Uuid,
        now: OffsetDateTime,
        txn: &DatabaseTransaction,
    ) -> Result<entity::accounts::Model> {
        let account = entity::accounts::Entity::find_by_id(account_id)
            .lock_exclusive()
            .one(txn)
            .await?;

        if let Some(account) = account {
            return Ok(account);
        }

        // If not found, insert (no-op if another transaction races) then re-lock
        let new_account = entity::accounts::ActiveModel {
            id: Set(account_id),
            balance: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };

        entity::accounts::Entity::insert(new_account)
            .on_conflict(
                OnConflict::column(entity::accounts::Column::Id)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(txn)
            .await?;

        entity::accounts::Entity::find_by_id(account_id)
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or_else(|| {
                ApiError::Internal(anyhow::anyhow!(
                    "Failed to create or lock account {}",
                    account_id
                ))
            })
    }
}
