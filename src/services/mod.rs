pub mod bump_executor;
pub mod bump_service;
pub mod catalog_service;
pub mod ledger_service;
pub mod listing_service;
pub mod purchase_service;
pub mod schedule_planner;
pub mod schedule_service;

pub use bump_service::BumpService;
pub use catalog_service::CatalogService;
pub use ledger_service::LedgerService;
pub use purchase_service::PurchaseService;
pub use schedule_service::ScheduleService;
