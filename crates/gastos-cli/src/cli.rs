//! CLI argument definitions using clap
//!
//! This module contains the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Gastos - spot overspending before the month ends
#[derive(Parser)]
#[command(name = "gastos")]
#[command(about = "Transaction analysis engine for household spending", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Engine config file (TOML); defaults apply when absent
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable AI refinement; rule-based categorization only
    #[arg(long, global = true)]
    pub no_ai: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one full analysis pass over a CSV transaction history
    Analyze {
        /// CSV file with date,description,amount[,kind] columns
        #[arg(short, long)]
        file: PathBuf,

        /// Analysis moment as YYYY-MM-DD (defaults to now)
        #[arg(long)]
        at: Option<String>,
    },

    /// Categorize transactions and print the labels
    Categorize {
        /// CSV file to categorize
        #[arg(short, long)]
        file: PathBuf,

        /// Maximum rows to print
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Show the recommended budget plan for the current month
    Budget {
        /// CSV file with transaction history
        #[arg(short, long)]
        file: PathBuf,

        /// Declared monthly income in pesos (overrides observed income)
        #[arg(long)]
        income: Option<f64>,
    },

    /// Show active alerts after one analysis pass
    Alerts {
        /// CSV file with transaction history
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Run the background scheduler until interrupted
    Run {
        /// CSV file with transaction history
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Inference backend commands
    Ai {
        #[command(subcommand)]
        action: AiAction,
    },
}

#[derive(Subcommand)]
pub enum AiAction {
    /// Check connectivity and run a sample categorization
    Test {
        /// Description to classify (a default sample is used when absent)
        #[arg(short, long)]
        description: Option<String>,
    },
}
