//! meetgate CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use meetgate_client::cli::{Cli, Command, ConfigAction};
use meetgate_client::commands;
use meetgate_client::config::ClientConfig;
use meetgate_client::error::ClientResult;
use meetgate_core::{TracingConfig, TracingOutputFormat, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli, config: &ClientConfig) -> ClientResult<()> {
    let mut tracing_config = if cli.debug || config.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::default()
    };

    if let Some(format) = cli.log_format.as_ref().or(config.log_format.as_ref()) {
        tracing_config = tracing_config.with_format(format.parse::<TracingOutputFormat>()?);
    }

    init_tracing(tracing_config)?;
    Ok(())
}

async fn run(cli: Cli) -> ClientResult<()> {
    // Load configuration
    let config = if let Some(ref path) = cli.config {
        ClientConfig::load_from(path)?
    } else {
        ClientConfig::load()?
    }
    .with_stored_secret(cli.shared_secret.clone());

    init_logging(&cli, &config)?;

    match cli.command {
        Command::Decide(ref args) => commands::decide::run(args, &config),
        Command::Join(ref args) => commands::join::run(args, &config).await,
        Command::Config { ref action } => match action {
            ConfigAction::Dump => commands::config::dump(&config),
            ConfigAction::Validate => commands::config::validate(&config).await,
            ConfigAction::Path => commands::config::path(),
        },
    }
}
