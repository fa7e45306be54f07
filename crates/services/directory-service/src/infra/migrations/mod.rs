//! Database migrations.
//!
//! Migration names follow the pattern: m{YYYYMMDD}_{NNNNNN}_{description}

use sea_orm_migration::prelude::*;

mod m20241016_000001_create_users_table;
mod m20241016_000002_create_credentials_table;
mod m20241016_000003_create_stores_table;
mod m20241016_000004_create_reviews_table;
mod m20241016_000005_create_store_hearts_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20241016_000001_create_users_table::Migration),
            Box::new(m20241016_000002_create_credentials_table::Migration),
            Box::new(m20241016_000003_create_stores_table::Migration),
            Box::new(m20241016_000004_create_reviews_table::Migration),
            Box::new(m20241016_000005_create_store_hearts_table::Migration),
        ]
    }
}
