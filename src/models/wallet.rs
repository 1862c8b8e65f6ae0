use crate::services::ledger_service::LedgerPosting;
use entity::{ledger_entries, sea_orm_active_enums::LedgerKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Credit deposit reported by payment capture
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreditRequest {
    pub account_id: Uuid,

    #[validate(range(min = 1))]
    pub amount: i32,

    #[validate(length(min = 1, max = 255))]
    pub reference: String,
}

/// Signed manual correction; never allowed to drive a balance negative
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentRequest {
    pub account_id: Uuid,

    pub amount: i32,

    #[validate(length(min = 1, max = 255))]
    pub reference: String,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntryView {
    pub id: Uuid,
    pub amount: i32,
    pub kind: LedgerKind,
    pub reference: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: time::OffsetDateTime,
}

impl From<ledger_entries::Model> for LedgerEntryView {
    fn from(entry: ledger_entries::Model) -> Self {
        Self {
            id: entry.id,
            amount: entry.amount,
            kind: entry.kind,
            reference: entry.reference,
            created_at: entry.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletData {
    pub account_id: Uuid,
    pub balance: i32,
    pub entries: Vec<LedgerEntryView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerPostingData {
    pub entry_id: Uuid,
    pub account_id: Uuid,
    pub amount: i32,
    pub balance: i32,
}

impl From<LedgerPosting> for LedgerPostingData {
    fn from(posting: LedgerPosting) -> Self {
        Self {
            entry_id: posting.entry_id,
            account_id: posting.account_id,
            amount: posting.amount,
            balance: posting.balance,
        }
    }
}
