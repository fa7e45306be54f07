//! Postgres pool and schema migrations.

use std::collections::HashSet;
use std::time::Duration;

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database as SeaDatabase, DatabaseConnection, DbErr,
    EntityTrait, Statement,
};
use sea_orm_migration::{seaql_migrations, MigratorTrait};

use super::migrations::Migrator;
use common::DatabaseConfig;

/// What the `migrate` command should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrateAction {
    /// Apply pending migrations.
    Up,
    /// Roll back the most recent migration.
    Down,
    /// Report without changing anything.
    Status,
    /// Drop all tables and re-apply every migration.
    Fresh,
}

/// One row of a migration report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationState {
    pub name: String,
    pub applied: bool,
}

#[derive(Clone)]
pub struct Database {
    connection: DatabaseConnection,
}

impl Database {
    /// Open the pool and bring the schema up to date.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DbErr> {
        let db = Self::open(config).await?;
        db.migrate(MigrateAction::Up).await?;
        tracing::info!(max_connections = config.max_connections, "database ready");
        Ok(db)
    }

    /// Open the pool without touching the schema.
    pub async fn open(config: &DatabaseConfig) -> Result<Self, DbErr> {
        let mut options = ConnectOptions::new(config.url.clone());
        options
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        Ok(Self {
            connection: SeaDatabase::connect(options).await?,
        })
    }

    /// Shared handle for repositories; clones share the pool.
    pub fn handle(&self) -> DatabaseConnection {
        self.connection.clone()
    }

    /// Run `action` and return the resulting state of every known migration.
    pub async fn migrate(&self, action: MigrateAction) -> Result<Vec<MigrationState>, DbErr> {
        match action {
            MigrateAction::Up => Migrator::up(&self.connection, None).await?,
            MigrateAction::Down => Migrator::down(&self.connection, Some(1)).await?,
            MigrateAction::Fresh => Migrator::fresh(&self.connection).await?,
            MigrateAction::Status => {}
        }
        self.report().await
    }

    async fn report(&self) -> Result<Vec<MigrationState>, DbErr> {
        let applied: HashSet<String> = seaql_migrations::Entity::find()
            .all(&self.connection)
            .await?
            .into_iter()
            .map(|row| row.version)
            .collect();

        Ok(Migrator::migrations()
            .iter()
            .map(|migration| {
                let name = migration.name().to_string();
                MigrationState {
                    applied: applied.contains(&name),
                    name,
                }
            })
            .collect())
    }

    /// `SELECT 1` round trip.
    pub async fn ping(&self) -> Result<(), DbErr> {
        let backend = self.connection.get_database_backend();
        self.connection
            .execute(Statement::from_string(backend, "SELECT 1"))
            .await
            .map(|_| ())
    }
}
