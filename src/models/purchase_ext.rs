/// Extension methods for purchases entity
///
/// Liveness rules for placements, kept next to the generated entity in
/// entity/src/purchases.rs.
use entity::{purchases, sea_orm_active_enums::PurchaseStatus};
use time::OffsetDateTime;

/// Extension trait for Purchase model
pub trait PurchaseExt {
    /// ACTIVE and not yet past `expires_at`
    fn is_running(&self, now: OffsetDateTime) -> bool;

    /// Still blocks a new purchase on the same listing
    fn is_live(&self, now: OffsetDateTime) -> bool;

    /// Whole days consumed since the last start or resume
    fn elapsed_days(&self, now: OffsetDateTime) -> i32;
}

impl PurchaseExt for purchases::Model {
    fn is_running(&self, now: OffsetDateTime) -> bool {
        self.status == PurchaseStatus::Active && self.expires_at > now
    }

    fn is_live(&self, now: OffsetDateTime) -> bool {
        match self.status {
            PurchaseStatus::Active => self.expires_at > now,
            PurchaseStatus::Paused => self.remaining_days > 0,
            PurchaseStatus::Expired => false,
        }
    }

    fn elapsed_days(&self, now: OffsetDateTime) -> i32 {
        let whole = (now - self.last_resumed_at).whole_days();
        whole.clamp(0, i32::MAX as i64) as i32
    }
}
