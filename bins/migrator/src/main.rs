//! Schema migration runner for the Strata ledger.
//!
//! Usage:
//!   migrator [up]    - Apply pending migrations and seed the default chart
//!   migrator down    - Roll back the last migration
//!   migrator status  - Show applied and pending migrations
//!   migrator fresh   - Drop everything and migrate from scratch
//!
//! The connection comes from `AppConfig` (`config/*` files and
//! `STRATA__DATABASE__URL`).

use std::process::ExitCode;

use sea_orm_migration::MigratorTrait;
use strata_db::migration::Migrator;
use strata_shared::config::AppConfig;
use strata_shared::telemetry::init_tracing;
use tracing::{error, info};

#[derive(Debug, Clone, Copy)]
enum Command {
    Up,
    Down,
    Status,
    Fresh,
}

impl Command {
    fn parse(arg: Option<&str>) -> Option<Self> {
        match arg {
            None | Some("up") => Some(Self::Up),
            Some("down") => Some(Self::Down),
            Some("status") => Some(Self::Status),
            Some("fresh") => Some(Self::Fresh),
            Some(_) => None,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = init_tracing(&config.logging) {
        eprintln!("Failed to initialise tracing: {e}");
    }

    let arg = std::env::args().nth(1);
    let Some(command) = Command::parse(arg.as_deref()) else {
        error!(command = ?arg, "Unknown command; expected up, down, status or fresh");
        return ExitCode::FAILURE;
    };

    let db = match strata_db::connect(&config.database).await {
        Ok(db) => db,
        Err(e) => {
            error!(error = %e, "Failed to connect to database");
            return ExitCode::FAILURE;
        }
    };

    let result = match command {
        Command::Up => Migrator::up(&db, None).await,
        Command::Down => Migrator::down(&db, Some(1)).await,
        Command::Status => Migrator::status(&db).await,
        Command::Fresh => Migrator::fresh(&db).await,
    };

    match result {
        Ok(()) => {
            info!(command = ?command, "Migration command completed");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(command = ?command, error = %e, "Migration command failed");
            ExitCode::FAILURE
        }
    }
}
