//! Add player statistics to users and map settings to maptiers

use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_users::Users;
use super::m20250101_000002_create_maptiers::Maptiers;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Unix epoch seconds
        manager
            .alter_table(
                Table::alter()
                    .table(Users::Table)
                    .add_column(ColumnDef::new(UserStats::Firstlogin).big_integer().null())
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(Users::Table)
                    .add_column(ColumnDef::new(UserStats::Lastlogin).big_integer().null())
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(Users::Table)
                    .add_column(
                        ColumnDef::new(UserStats::Points)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .to_owned(),
            )
            .await?;

        // Seconds on the server
        manager
            .alter_table(
                Table::alter()
                    .table(Users::Table)
                    .add_column(
                        ColumnDef::new(UserStats::Playtime)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(Maptiers::Table)
                    .add_column(ColumnDef::new(MapSettings::Maxvelocity).double().null())
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(Maptiers::Table)
                    .add_column(ColumnDef::new(MapSettings::AutobhopEnabled).boolean().null())
                    .to_owned(),
            )
            .await?;

        // Server rank ordering
        manager
            .create_index(
                Index::create()
                    .name("idx_users_points")
                    .table(Users::Table)
                    .col(UserStats::Points)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_users_points")
                    .table(Users::Table)
                    .to_owned(),
            )
            .await?;

        // SQLite cannot drop columns; they stay behind
        Ok(())
    }
}

#[derive(Iden)]
enum UserStats {
    Firstlogin,
    Lastlogin,
    Points,
    Playtime,
}

#[derive(Iden)]
enum MapSettings {
    Maxvelocity,
    AutobhopEnabled,
}
