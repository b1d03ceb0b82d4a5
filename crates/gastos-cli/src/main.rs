//! Gastos CLI - household spending monitor
//!
//! Usage:
//!   gastos analyze --file txns.csv     Run one full analysis pass
//!   gastos categorize --file txns.csv  Label transactions
//!   gastos budget --file txns.csv      Show the recommended plan
//!   gastos alerts --file txns.csv      Show active alerts
//!   gastos run --file txns.csv         Run the scheduler until Ctrl-C

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (warn; command
    // output itself goes to stdout)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = commands::load_config(cli.config.as_deref(), cli.no_ai)?;

    match cli.command {
        Commands::Analyze { file, at } => {
            commands::cmd_analyze(config, &file, at.as_deref()).await
        }
        Commands::Categorize { file, limit } => {
            commands::cmd_categorize(config, &file, limit).await
        }
        Commands::Budget { file, income } => commands::cmd_budget(config, &file, income).await,
        Commands::Alerts { file } => commands::cmd_alerts(config, &file).await,
        Commands::Run { file } => commands::cmd_run(config, &file).await,
        Commands::Ai { action } => match action {
            AiAction::Test { description } => {
                commands::cmd_ai_test(config, description.as_deref()).await
            }
        },
    }
}
