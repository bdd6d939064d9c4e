//! Order Desk CLI - Database migrations and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending database migrations
//! od-cli migrate
//!
//! # Verify the database is reachable
//! od-cli check
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations from `crates/api/migrations/`
//! - `check` - Connect and run `SELECT 1`

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "od-cli")]
#[command(author, version, about = "Order Desk CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Check database connectivity
    Check,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Check => commands::check::run().await?,
    }
    Ok(())
}
