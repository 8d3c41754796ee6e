//! Migration to create the maptiers table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Maptiers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Maptiers::Map)
                            .string_len(255)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Maptiers::Tier)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Maptiers::MapType).string_len(32).null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Maptiers::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Maptiers {
    Table,
    Map,
    Tier,
    MapType,
}
