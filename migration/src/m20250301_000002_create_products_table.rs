use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(pk_uuid(Products::Id))
                    .col(string_len(Products::Code, 64).not_null().unique_key())
                    .col(string(Products::Label).not_null())
                    .col(string_len(Products::WindowType, 16).not_null())
                    .col(integer(Products::QuantityPerWindow).not_null())
                    .col(integer(Products::DurationDays).not_null())
                    .col(integer(Products::CreditsCost).not_null().default(0))
                    // Non-null selects per-day pricing bounded by min/max days
                    .col(integer_null(Products::PricePerDayCredits))
                    .col(integer_null(Products::MinDays))
                    .col(integer_null(Products::MaxDays))
                    .col(boolean(Products::Active).not_null().default(true))
                    .col(
                        timestamp_with_time_zone(Products::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Products::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_products_active")
                    .table(Products::Table)
                    .col(Products::Active)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
    Code,
    Label,
    WindowType,
    QuantityPerWindow,
    DurationDays,
    CreditsCost,
    PricePerDayCredits,
    MinDays,
    MaxDays,
    Active,
    CreatedAt,
    UpdatedAt,
}
