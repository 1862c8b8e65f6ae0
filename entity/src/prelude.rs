//! `SeaORM` Entity prelude

pub use super::accounts::Entity as Accounts;
pub use super::bump_logs::Entity as BumpLogs;
pub use super::ledger_entries::Entity as LedgerEntries;
pub use super::listings::Entity as Listings;
pub use super::products::Entity as Products;
pub use super::purchases::Entity as Purchases;
pub use super::schedule_entries::Entity as ScheduleEntries;
