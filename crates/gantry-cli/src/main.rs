//! Gantry CLI entrypoint.

use clap::Parser;

mod commands;
mod config;
mod handlers;
mod template;

use commands::{Commands, ConfigCommands};
use config::CliConfig;

#[derive(Parser)]
#[command(name = "gantry")]
#[command(author, version, about = "Pull-request check matrix runner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = CliConfig::load().unwrap_or_default();

    match cli.command {
        Commands::Init { force } => handlers::init(force).await?,
        Commands::Validate { path } => handlers::validate(&config, path.as_deref()).await?,
        Commands::Jobs { path } => handlers::jobs(&config, path.as_deref()).await?,
        Commands::Run {
            path,
            branch,
            base,
            revision,
            event,
            job,
        } => {
            handlers::run(
                &config,
                path.as_deref(),
                branch,
                base,
                revision,
                event,
                job,
            )
            .await?
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => handlers::show_config(&config)?,
            ConfigCommands::Set { key, value } => handlers::set_config(&key, &value)?,
        },
    }

    Ok(())
}
