//! `SeaORM` Entity

use super::sea_orm_active_enums::{BumpWindow, PurchaseStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchases")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub listing_id: Uuid,
    pub account_id: Uuid,
    pub product_id: Uuid,
    pub product_code: String,
    pub window_type: BumpWindow,
    pub quantity_per_window: i32,
    pub days: i32,
    pub credits_spent: i32,
    pub status: PurchaseStatus,
    pub started_at: TimeDateTimeWithTimeZone,
    pub last_resumed_at: TimeDateTimeWithTimeZone,
    pub expires_at: TimeDateTimeWithTimeZone,
    pub remaining_days: i32,
    pub paused_at: Option<TimeDateTimeWithTimeZone>,
    pub created_at: TimeDateTimeWithTimeZone,
    pub updated_at: TimeDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::listings::Entity",
        from = "Column::ListingId",
        to = "super::listings::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Listings,
    #[sea_orm(
        belongs_to = "super::products::Entity",
        from = "Column::ProductId",
        to = "super::products::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Products,
    #[sea_orm(has_many = "super::schedule_entries::Entity")]
    ScheduleEntries,
}

impl Related<super::listings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Listings.def()
    }
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl Related<super::schedule_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ScheduleEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
