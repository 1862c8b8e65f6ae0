use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Only the listing fields touched by bumps; content lives elsewhere
        manager
            .create_table(
                Table::create()
                    .table(Listings::Table)
                    .if_not_exists()
                    .col(pk_uuid(Listings::Id))
                    .col(uuid(Listings::OwnerAccountId).not_null())
                    .col(string(Listings::Title).not_null())
                    .col(timestamp_with_time_zone(Listings::PublishedAt).not_null())
                    .col(timestamp_with_time_zone_null(Listings::LastBumpAt))
                    .col(integer(Listings::BumpCount).not_null().default(0))
                    .col(
                        timestamp_with_time_zone(Listings::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_listings_owner_account_id")
                    .table(Listings::Table)
                    .col(Listings::OwnerAccountId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_listings_published_at")
                    .table(Listings::Table)
                    .col(Listings::PublishedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Listings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Listings {
    Table,
    Id,
    OwnerAccountId,
    Title,
    PublishedAt,
    LastBumpAt,
    BumpCount,
    CreatedAt,
}
