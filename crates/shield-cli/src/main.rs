mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod utils;

use crate::cli::{Cli, Commands};
use crate::error::{CliError, INTERRUPTED_EXIT_CODE, Result};
use clap::Parser;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() {
    if let Err(e) = run_app().await {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.clone())?;

    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default().into_hooks();
    eyre_hook.install().map_err(|e| CliError::Other(e.into()))?;
    std::panic::set_hook(Box::new(move |pi| {
        error!("{}", panic_hook.panic_report(pi));
    }));

    info!("🚀 shield v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    let interrupt = Arc::new(AtomicBool::new(false));
    tokio::spawn(listen_for_interrupts(interrupt.clone()));

    let command_result = match cli.command {
        Commands::Run(args) => {
            info!("Dispatching to 'run' command.");
            commands::run::run(args, interrupt).await
        }
        Commands::Rank(args) => {
            info!("Dispatching to 'rank' command.");
            commands::rank::run(args).await
        }
    };

    match &command_result {
        Ok(_) => {
            info!("✅ Command completed successfully.");
            println!("✅ Command completed successfully.");
        }
        Err(e) => error!("❌ Command failed: {}", e),
    }

    command_result
}

/// The first interrupt asks the sweep to stop and save; a second one exits at once.
async fn listen_for_interrupts(flag: Arc<AtomicBool>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for interrupts: {}", e);
        return;
    }
    warn!("Interrupt received; stopping the running engine and saving results.");
    eprintln!("\nInterrupt received; saving results. Press Ctrl-C again to exit immediately.");
    flag.store(true, Ordering::SeqCst);

    if tokio::signal::ctrl_c().await.is_ok() {
        eprintln!("Second interrupt received; exiting without waiting for the save.");
        std::process::exit(INTERRUPTED_EXIT_CODE);
    }
}
