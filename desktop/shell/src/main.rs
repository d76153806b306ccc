//! brief-desk - desktop host for the Brief Desk backend
//!
//! ```bash
//! # Start the backend and keep it alive until Ctrl+C
//! brief-desk
//!
//! # Inspect the settings the UI reads
//! brief-desk store get predefinedComments --pretty
//! ```

use brief_desk::cli::{Cli, Commands};
use brief_desk::logging::{current_log_path, setup_logging};
use brief_desk::paths::{AppPaths, BuildMode};
use brief_desk::supervisor::SupervisorConfig;

use std::process::ExitCode;

use clap::Parser;
use tracing::info;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mode = if cli.packaged {
        BuildMode::Packaged
    } else {
        BuildMode::detect()
    };
    let paths = AppPaths::resolve(mode, cli.data_dir.clone());

    let config = match SupervisorConfig::load_or_create(paths.data_dir()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}\n\nHint: {}", e.recovery_hint());
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = setup_logging(paths.data_dir(), &config.logging) {
        eprintln!("Failed to initialize logging: {e}");
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            info!("Starting Brief Desk v{}", env!("CARGO_PKG_VERSION"));
            info!("Mode: {}", paths.mode().as_str());
            info!("Data directory: {:?}", paths.data_dir());
            info!(
                "Log file: {:?}",
                current_log_path(paths.data_dir(), &config.logging)
            );
            brief_desk::run(&paths, &config).await
        }
        command => brief_desk::execute(command, &paths, cli.pretty),
    }
}
