//! CLI parse: clap types for Bookwright. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Bookwright CLI - resumable book generation from structured plans
#[derive(Parser, Debug)]
#[command(name = "bookwright", version)]
#[command(about = "Generate books unit by unit from a plan; re-run to resume")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (when output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Generate every missing unit of a book
    Run {
        /// Book directory name under the books root (prompted for when omitted)
        book: Option<String>,
        /// Number of units generated concurrently
        #[arg(long)]
        concurrency: Option<usize>,
        /// Stop dispatching new units after the first failure
        #[arg(long)]
        fail_fast: bool,
    },
    /// Show which units of a book are already written
    Status {
        book: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List books under the books root
    List {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Check a book plan without generating anything
    Validate { book: String },
}

impl Commands {
    /// Command name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Run { .. } => "run",
            Commands::Status { .. } => "status",
            Commands::List { .. } => "list",
            Commands::Validate { .. } => "validate",
        }
    }
}
