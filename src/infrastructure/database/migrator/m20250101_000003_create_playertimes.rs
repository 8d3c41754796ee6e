//! Migration to create the playertimes table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Playertimes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Playertimes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Playertimes::Auth).integer().not_null())
                    .col(ColumnDef::new(Playertimes::Map).string_len(255).not_null())
                    .col(ColumnDef::new(Playertimes::Time).double().not_null())
                    .col(
                        ColumnDef::new(Playertimes::Track)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Playertimes::Points)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(Playertimes::Date).big_integer().not_null())
                    .col(
                        ColumnDef::new(Playertimes::Style)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        // Listing order and best-time lookups
        manager
            .create_index(
                Index::create()
                    .name("idx_playertimes_date")
                    .table(Playertimes::Table)
                    .col(Playertimes::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_playertimes_map_track_style")
                    .table(Playertimes::Table)
                    .col(Playertimes::Map)
                    .col(Playertimes::Track)
                    .col(Playertimes::Style)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Playertimes::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Playertimes {
    Table,
    Id,
    Auth,
    Map,
    Time,
    Track,
    Points,
    Date,
    Style,
}
