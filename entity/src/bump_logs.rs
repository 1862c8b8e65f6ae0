//! `SeaORM` Entity

use super::sea_orm_active_enums::{BumpTrigger, BumpWindow};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bump_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub listing_id: Uuid,
    pub purchase_id: Option<Uuid>,
    pub schedule_entry_id: Option<Uuid>,
    pub bumped_at: TimeDateTimeWithTimeZone,
    pub window: BumpWindow,
    pub trigger: BumpTrigger,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
