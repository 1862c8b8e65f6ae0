use entity::{
    bump_logs, purchases, schedule_entries,
    sea_orm_active_enums::{BumpTrigger, BumpWindow, PurchaseStatus, ScheduleStatus},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Buy a bump placement for one listing
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub listing_id: Uuid,

    #[validate(length(min = 1, max = 64))]
    pub product_code: String,

    /// Checked against the product's own day bounds, not here
    pub days: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseData {
    pub purchase_id: Uuid,
    pub listing_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: time::OffsetDateTime,
    pub credits_spent: i32,
    pub balance: i32,
    pub scheduled_bumps: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BumpNowData {
    #[serde(with = "time::serde::rfc3339")]
    pub bumped_at: time::OffsetDateTime,
    pub window: BumpWindow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementAction {
    Pause,
    Resume,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementActionRequest {
    pub action: PlacementAction,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PlacementSummary {
    pub purchase_id: Uuid,
    pub listing_id: Uuid,
    pub product_code: String,
    pub status: PurchaseStatus,
    pub window_type: BumpWindow,
    pub quantity_per_window: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: time::OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: time::OffsetDateTime,
    pub remaining_days: i32,
    #[serde(with = "time::serde::rfc3339::option")]
    pub paused_at: Option<time::OffsetDateTime>,
}

impl From<purchases::Model> for PlacementSummary {
    fn from(purchase: purchases::Model) -> Self {
        Self {
            purchase_id: purchase.id,
            listing_id: purchase.listing_id,
            product_code: purchase.product_code,
            status: purchase.status,
            window_type: purchase.window_type,
            quantity_per_window: purchase.quantity_per_window,
            started_at: purchase.started_at,
            expires_at: purchase.expires_at,
            remaining_days: purchase.remaining_days,
            paused_at: purchase.paused_at,
        }
    }
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntryView {
    pub id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub run_at: time::OffsetDateTime,
    pub window: BumpWindow,
    pub status: ScheduleStatus,
}

impl From<schedule_entries::Model> for ScheduleEntryView {
    fn from(entry: schedule_entries::Model) -> Self {
        Self {
            id: entry.id,
            run_at: entry.run_at,
            window: entry.window,
            status: entry.status,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleData {
    pub placement: PlacementSummary,
    pub bumps_today: u64,
    pub pending_today: u64,
    pub entries: Vec<ScheduleEntryView>,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BumpLogView {
    #[serde(with = "time::serde::rfc3339")]
    pub bumped_at: time::OffsetDateTime,
    pub window: BumpWindow,
    pub trigger: BumpTrigger,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<bump_logs::Model> for BumpLogView {
    fn from(log: bump_logs::Model) -> Self {
        Self {
            bumped_at: log.bumped_at,
            window: log.window,
            trigger: log.trigger,
            success: log.success,
            error: log.error,
        }
    }
}
