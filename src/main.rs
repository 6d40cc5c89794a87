//! devflow CLI binary entry point.

use clap::Parser;
use devflow::cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Login => devflow::cli::auth::handle_login(config).await,
        Commands::Token => devflow::cli::auth::handle_token(config).await,
        Commands::Status => devflow::cli::auth::handle_status(config).await,
        Commands::Logout => devflow::cli::auth::handle_logout(config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
