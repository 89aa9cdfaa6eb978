// `main.rs` is intentionally tiny: it sets up tracing, parses the command
// line and hands over to `app::run()`, which owns the whole invocation.
mod app;
mod cli;
mod config;
mod console;
mod error;
mod mqtt;
mod wakeup;

#[cfg(test)]
mod test_broker;

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use crate::cli::Args;

#[tokio::main]
async fn main() -> ExitCode {
    setup_logging();

    let args = match Args::try_parse_args(std::env::args_os()) {
        Ok(args) => args,
        Err(e) => {
            if let Err(err) = e.print() {
                tracing::debug!(error = %err, "failed to print usage");
            }
            // --help and --version land here too; only real errors fail.
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    app::run(args).await
}

/// Diagnostics on stderr, filtered by RUST_LOG (default: warn). Phase
/// reports are plain console output and not affected by this.
fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
