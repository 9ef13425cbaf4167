//! CLI command definitions and subcommands

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// BatchQueue - priority batch ingestion daemon
#[derive(Parser, Debug)]
#[command(
    name = "bq",
    about = "Priority batch ingestion with a rate-limited dispatch loop",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Override the daemon socket path
    #[arg(short, long, global = true)]
    pub socket: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the daemon in the foreground
    Daemon,

    /// Submit item IDs for ingestion
    Submit {
        /// Item IDs (1 to 1000000007)
        #[arg(required = true)]
        ids: Vec<u64>,

        /// Priority: HIGH, MEDIUM or LOW (validated by the daemon)
        #[arg(short, long)]
        priority: Option<String>,
    },

    /// Show the status of a submission
    Status {
        /// Submission ID returned by `submit`
        submission_id: String,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show queue and record counters
    Stats {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Check whether the daemon is running
    Ping,

    /// Ask the daemon to stop
    Stop,
}

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
