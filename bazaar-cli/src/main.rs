//! Bazaar CLI entry point.

mod cli;
mod commands;
mod error;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use commands::{load_config, App};
use error::{CliError, CliResult};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging()?;

    let config = load_config(cli.config.as_deref())?;
    let app = App::new(config, &cli.route)?;

    let result = match &cli.command {
        Commands::Login(args) => app.login(args).await,
        Commands::Logout => app.logout().await,
        Commands::Whoami => app.whoami(),
        Commands::Products(args) => app.list_products(args).await,
        Commands::Product(args) => app.show_product(args).await,
    };

    if let Some(route) = app.redirected_to() {
        warn!(%route, "session expired; sign in again");
    }
    result
}

/// Logs go to stderr so command output on stdout stays machine-readable.
fn init_logging() -> CliResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))
}
