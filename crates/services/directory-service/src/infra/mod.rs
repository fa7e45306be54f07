//! Infrastructure layer - database, mail and file storage.

mod db;
pub mod mailer;
pub mod migrations;
pub mod photos;

pub use db::{Database, MigrateAction, MigrationState};
pub use mailer::{mailer_from_config, LogMailer, Mailer, OutgoingMail, SmtpMailer};
pub use migrations::Migrator;
pub use photos::{LocalPhotoStorage, PhotoStorage, PhotoUpload};

#[cfg(any(test, feature = "test-utils"))]
pub use mailer::MockMailer;
#[cfg(any(test, feature = "test-utils"))]
pub use photos::MockPhotoStorage;
