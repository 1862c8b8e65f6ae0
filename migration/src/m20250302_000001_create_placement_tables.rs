use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Purchases snapshot the product cadence and price at purchase time.
        // listing_id carries no foreign key: listings are owned by the
        // marketplace and may disappear under a live purchase.
        manager
            .create_table(
                Table::create()
                    .table(Purchases::Table)
                    .if_not_exists()
                    .col(pk_uuid(Purchases::Id))
                    .col(uuid(Purchases::ListingId).not_null())
                    .col(uuid(Purchases::AccountId).not_null())
                    .col(uuid(Purchases::ProductId).not_null())
                    .col(string_len(Purchases::ProductCode, 64).not_null())
                    .col(string_len(Purchases::WindowType, 16).not_null())
                    .col(integer(Purchases::QuantityPerWindow).not_null())
                    .col(integer(Purchases::Days).not_null())
                    .col(integer(Purchases::CreditsSpent).not_null())
                    .col(string_len(Purchases::Status, 16).not_null())
                    .col(timestamp_with_time_zone(Purchases::StartedAt).not_null())
                    .col(timestamp_with_time_zone(Purchases::LastResumedAt).not_null())
                    .col(timestamp_with_time_zone(Purchases::ExpiresAt).not_null())
                    .col(integer(Purchases::RemainingDays).not_null())
                    .col(timestamp_with_time_zone_null(Purchases::PausedAt))
                    .col(
                        timestamp_with_time_zone(Purchases::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Purchases::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchases_product_id")
                            .from(Purchases::Table, Purchases::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_purchases_listing_status")
                    .table(Purchases::Table)
                    .col(Purchases::ListingId)
                    .col(Purchases::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_purchases_product_id")
                    .table(Purchases::Table)
                    .col(Purchases::ProductId)
                    .to_owned(),
            )
            .await?;

        // Durable bump queue
        manager
            .create_table(
                Table::create()
                    .table(ScheduleEntries::Table)
                    .if_not_exists()
                    .col(pk_uuid(ScheduleEntries::Id))
                    .col(uuid(ScheduleEntries::PurchaseId).not_null())
                    .col(uuid(ScheduleEntries::ListingId).not_null())
                    .col(timestamp_with_time_zone(ScheduleEntries::RunAt).not_null())
                    .col(string_len(ScheduleEntries::Window, 16).not_null())
                    .col(string_len(ScheduleEntries::Status, 16).not_null())
                    .col(timestamp_with_time_zone_null(ScheduleEntries::ExecutedAt))
                    .col(string_null(ScheduleEntries::Resolution))
                    .col(
                        timestamp_with_time_zone(ScheduleEntries::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_schedule_entries_purchase_id")
                            .from(ScheduleEntries::Table, ScheduleEntries::PurchaseId)
                            .to(Purchases::Table, Purchases::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Worker scan: status = PENDING AND run_at <= now ORDER BY run_at
        manager
            .create_index(
                Index::create()
                    .name("idx_schedule_entries_status_run_at")
                    .table(ScheduleEntries::Table)
                    .col(ScheduleEntries::Status)
                    .col(ScheduleEntries::RunAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_schedule_entries_purchase_id")
                    .table(ScheduleEntries::Table)
                    .col(ScheduleEntries::PurchaseId)
                    .to_owned(),
            )
            .await?;

        // Append-only audit of bump attempts
        manager
            .create_table(
                Table::create()
                    .table(BumpLogs::Table)
                    .if_not_exists()
                    .col(pk_uuid(BumpLogs::Id))
                    .col(uuid(BumpLogs::ListingId).not_null())
                    .col(uuid_null(BumpLogs::PurchaseId))
                    .col(uuid_null(BumpLogs::ScheduleEntryId))
                    .col(timestamp_with_time_zone(BumpLogs::BumpedAt).not_null())
                    .col(string_len(BumpLogs::Window, 16).not_null())
                    .col(string_len(BumpLogs::Trigger, 16).not_null())
                    .col(boolean(BumpLogs::Success).not_null())
                    .col(text_null(BumpLogs::Error))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bump_logs_listing_bumped_at")
                    .table(BumpLogs::Table)
                    .col(BumpLogs::ListingId)
                    .col(BumpLogs::BumpedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BumpLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ScheduleEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Purchases::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Purchases {
    Table,
    Id,
    ListingId,
    AccountId,
    ProductId,
    ProductCode,
    WindowType,
    QuantityPerWindow,
    Days,
    CreditsSpent,
    Status,
    StartedAt,
    LastResumedAt,
    ExpiresAt,
    RemainingDays,
    PausedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ScheduleEntries {
    Table,
    Id,
    PurchaseId,
    ListingId,
    RunAt,
    Window,
    Status,
    ExecutedAt,
    Resolution,
    CreatedAt,
}

#[derive(DeriveIden)]
enum BumpLogs {
    Table,
    Id,
    ListingId,
    PurchaseId,
    ScheduleEntryId,
    BumpedAt,
    Window,
    Trigger,
    Success,
    Error,
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
}
