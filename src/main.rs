//! Main entry point for the tarwalk CLI app

use std::process::ExitCode;

use tarwalk::cli::LOG_ENV;
use tarwalk::cli_runner;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    init_logging();

    if let Err(e) = cli_runner::run_cli_app() {
        // --help / --version and usage errors are rendered by clap itself
        if let Some(clap_err) = e.downcast_ref::<clap::Error>() {
            clap_err.exit();
        }
        eprintln!("Error: {}", e);
        return ExitCode::from(cli_runner::exit_code_for(e.as_ref()));
    }
    ExitCode::SUCCESS
}

/// Logs go to stderr so that `--json` output on stdout stays parseable.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
