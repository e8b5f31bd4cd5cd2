//! Atelier CLI entry point.

use clap::Parser;

use atelier::cli::{Cli, Commands};
use atelier::infrastructure::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logging comes up from the merged config so level/format overrides in
    // .atelier/config.yaml and ATELIER_* env vars apply; a broken config
    // still gets a default subscriber so the error itself is visible.
    let log_config = atelier::cli::commands::load_config(cli.config.as_deref())
        .map(|c| c.logging)
        .unwrap_or_default();
    if let Err(err) = logging::init(&log_config) {
        eprintln!("failed to initialize logging: {err:#}");
    }

    let config_path = cli.config.as_deref();
    let result = match cli.command {
        Commands::Run(args) => atelier::cli::commands::run::execute(args, config_path, cli.json).await,
        Commands::Runs(args) => {
            atelier::cli::commands::runs::execute(args, config_path, cli.json).await
        }
        Commands::Hitl(args) => {
            atelier::cli::commands::hitl::execute(args, config_path, cli.json).await
        }
    };

    if let Err(err) = result {
        atelier::cli::handle_error(err, cli.json);
    }
}
