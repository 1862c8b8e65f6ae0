pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_wallet_tables;
mod m20250301_000002_create_products_table;
mod m20250301_000003_create_listings_table;
mod m20250302_000001_create_placement_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_wallet_tables::Migration),
            Box::new(m20250301_000002_create_products_table::Migration),
            Box::new(m20250301_000003_create_listings_table::Migration),
            Box::new(m20250302_000001_create_placement_tables::Migration),
        ]
    }
}
