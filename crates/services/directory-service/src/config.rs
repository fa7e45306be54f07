//! Directory service configuration.

use std::path::PathBuf;

use common::{env_or, AppResult, DatabaseConfig, JwtConfig, MailConfig};

/// Directory service configuration.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
    /// Directory uploaded store photos are written to
    pub upload_dir: PathBuf,
}

impl DirectoryConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            database: DatabaseConfig::from_env(),
            jwt: JwtConfig::from_env()?,
            mail: MailConfig::from_env(),
            upload_dir: PathBuf::from(env_or("UPLOAD_DIR", "public/uploads")),
        })
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            jwt: JwtConfig::default(),
            mail: MailConfig::default(),
            upload_dir: PathBuf::from("public/uploads"),
        }
    }
}
