//! `SeaORM` Entity definitions

pub mod prelude;

pub mod accounts;
pub mod bump_logs;
pub mod ledger_entries;
pub mod listings;
pub mod products;
pub mod purchases;
pub mod schedule_entries;
pub mod sea_orm_active_enums;
