//! Database migrations module
//!
//! The same schema is applied to every game-mode database.

pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_users;
mod m20250101_000002_create_maptiers;
mod m20250101_000003_create_playertimes;
mod m20250101_000004_add_player_stats;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_users::Migration),
            Box::new(m20250101_000002_create_maptiers::Migration),
            Box::new(m20250101_000003_create_playertimes::Migration),
            Box::new(m20250101_000004_add_player_stats::Migration),
        ]
    }
}
