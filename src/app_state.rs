use crate::{
    config::Config,
    services::{
        BumpService, CatalogService, LedgerService, PurchaseService, ScheduleService,
    },
};
use anyhow::Context;
use sea_orm::{ConnectOptions, DatabaseConnection};
use std::sync::Arc;
use time::UtcOffset;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub ledger_service: Arc<LedgerService>,
    pub catalog_service: Arc<CatalogService>,
    pub purchase_service: Arc<PurchaseService>,
    pub schedule_service: Arc<ScheduleService>,
    pub bump_service: Arc<BumpService>,
    pub utc_offset: UtcOffset,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self, anyhow::Error> {
        let mut options = ConnectOptions::new(config.database.url.clone());
        if let Some(max) = config.database.max_connections {
            options.max_connections(max);
        }
        options.sqlx_logging(false);

        let db = sea_orm::Database::connect(options)
            .await
            .context("connecting to database")?;

        Self::with_db(config, db)
    }

    /// Build services over an existing connection
    pub fn with_db(config: Config, db: DatabaseConnection) -> Result<Self, anyhow::Error> {
        let utc_offset = config
            .scheduling
            .utc_offset()
            .context("scheduling.utc_offset_minutes is out of range")?;

        let ledger_service = Arc::new(LedgerService::new(db.clone()));
        let catalog_service = Arc::new(CatalogService::new(db.clone()));
        let purchase_service = Arc::new(PurchaseService::new(db.clone(), utc_offset));
        let schedule_service = Arc::new(ScheduleService::new(db.clone(), utc_offset));
        let bump_service = Arc::new(BumpService::new(
            db.clone(),
            schedule_service.clone(),
            utc_offset,
        ));

        Ok(Self {
            db,
            ledger_service,
            catalog_service,
            purchase_service,
            schedule_service,
            bump_service,
            utc_offset,
            config: Arc::new(config),
        })
    }
}
