//! statcard CLI entry point.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use clap::Parser;
use std::process::ExitCode;

use statcard::cli::{Cli, Commands, FetchArgs};
use statcard::core::logging::{self, LogSettings};
use statcard::storage::config::process_env;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    logging::init(&LogSettings::resolve(
        cli.log_level.as_deref(),
        cli.json_output,
        cli.verbose,
        &process_env,
    ));

    let format = cli.effective_format();
    let no_color = cli.no_color;
    let pretty = cli.pretty;

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = %e, code = e.error_code(), "Command failed");
            eprintln!(
                "{}",
                statcard::render::error::render_error(&e, format, no_color, pretty)
            );
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

async fn run(cli: &Cli) -> statcard::Result<()> {
    match &cli.command {
        // Bare `statcard` fetches every configured source
        None => statcard::cli::fetch::execute(cli, &FetchArgs::default()).await,
        Some(Commands::Fetch(args)) => statcard::cli::fetch::execute(cli, args).await,
        Some(Commands::Cache(cmd)) => statcard::cli::cache::execute(cli, cmd),
        Some(Commands::Config(cmd)) => statcard::cli::config::execute(cli, cmd),
    }
}
