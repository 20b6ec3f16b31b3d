use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;

#[derive(Parser)]
#[command(name = "backend")]
#[command(about = "Dental clinic API server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API and WebSocket (default)
    Serve,
    /// Seed the catalog, templates and admin account, then exit
    Seed,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    clinic::init_tracing();

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => clinic::start_server().await,
        Commands::Seed => clinic::seed_only().await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
