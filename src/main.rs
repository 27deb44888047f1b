//! safebox CLI entry point.
//!
//! Initializes logging and delegates to the CLI module for command handling.

use safebox::output::error_line;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Exit code for detection, configuration and engine errors.
const FAILURE_EXIT_CODE: i32 = 1;

#[tokio::main]
async fn main() {
    // Parse CLI arguments first to get the log filter
    let cli = safebox::cli::parse_cli();

    // Priority: RUST_LOG env var > --log-level > --verbose > default "warn"
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| cli.log_filter());

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)))
        .init();

    let code = match safebox::cli::run_with_cli(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", error_line(&format!("{e:#}")));
            FAILURE_EXIT_CODE
        }
    };
    std::process::exit(code);
}
