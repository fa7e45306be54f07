//! Directory Service Library
//!
//! Stores, reviews, accounts and authentication for the store directory:
//! sea-orm repositories, the services composed over them, and the mail and
//! photo capabilities they call out to. The gateway embeds this crate.

pub mod config;
pub mod infra;
pub mod repository;
pub mod service;

use crate::infra::Database;
use common::{AppResult, DatabaseConfig};

pub use crate::config::DirectoryConfig;
pub use crate::infra::{MigrateAction, MigrationState};
pub use crate::service::{ServiceContainer, Services};

/// Run a migration action against the configured database and print the
/// resulting migration table.
pub async fn run_migrations(action: MigrateAction, config: &DatabaseConfig) -> AppResult<()> {
    let db = Database::open(config).await?;
    let states = db.migrate(action).await?;

    let pending = states.iter().filter(|state| !state.applied).count();
    tracing::info!(?action, total = states.len(), pending, "migrations finished");
    for state in &states {
        println!("{} {}", if state.applied { "[x]" } else { "[ ]" }, state.name);
    }

    Ok(())
}
