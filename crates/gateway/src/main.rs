//! Store directory gateway - HTTP server and migration CLI.

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use common::DatabaseConfig;
use directory_service_lib::MigrateAction;
use gateway_lib::config::GatewayConfig;

#[derive(Parser)]
#[command(name = "gateway")]
#[command(about = "Store directory HTTP gateway")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        #[arg(long, env = "GATEWAY_HOST")]
        host: Option<String>,
        #[arg(long, env = "GATEWAY_PORT")]
        port: Option<u16>,
    },
    /// Manage database migrations
    Migrate {
        #[arg(value_enum, default_value = "up")]
        action: MigrateCommand,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MigrateCommand {
    /// Apply pending migrations
    Up,
    /// Roll back the last migration
    Down,
    /// List migrations and whether they are applied
    Status,
    /// Drop everything and re-apply all migrations
    Fresh,
}

impl From<MigrateCommand> for MigrateAction {
    fn from(command: MigrateCommand) -> Self {
        match command {
            MigrateCommand::Up => MigrateAction::Up,
            MigrateCommand::Down => MigrateAction::Down,
            MigrateCommand::Status => MigrateAction::Status,
            MigrateCommand::Fresh => MigrateAction::Fresh,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port } => {
            let defaults = GatewayConfig::default();
            let host = host.unwrap_or(defaults.host);
            let port = port.unwrap_or(defaults.port);
            gateway_lib::run_server(&host, port).await?;
        }
        Commands::Migrate { action } => {
            directory_service_lib::run_migrations(action.into(), &DatabaseConfig::from_env())
                .await?;
        }
    }

    Ok(())
}
