//! Synthnoise CLI entry point

use clap::Parser;
use tracing::{error, info};

use synthnoise_cli::{cli::Cli, commands::CommandDispatcher};

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    if let Err(e) = CommandDispatcher::execute(cli) {
        error!("Command execution failed: {}", e);
        std::process::exit(1);
    }

    info!("synthnoise exited successfully");
}

/// Setup logging based on verbosity level
///
/// Logs go to standard error; standard output carries records.
fn setup_logging(verbose: bool) {
    let log_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
