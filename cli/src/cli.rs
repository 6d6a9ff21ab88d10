//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use history::Risk;

/// Credence - inspect and maintain the local analysis history.
#[derive(Debug, Parser)]
#[command(name = "credence")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the persisted history (defaults to the platform data dir)
    #[arg(long, global = true, env = "CREDENCE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Maximum number of analyses kept
    #[arg(long, global = true, env = "CREDENCE_CAPACITY")]
    pub capacity: Option<usize>,

    /// Storage key the history is saved under
    #[arg(long, global = true, env = "CREDENCE_KEY")]
    pub key: Option<String>,

    /// Log store activity to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record a classifier result (JSON from FILE or stdin)
    Add { file: Option<PathBuf> },

    /// List stored analyses
    List(ListArgs),

    /// Print one analysis as JSON
    Show { id: String },

    /// Delete one analysis
    Delete { id: String },

    /// Delete every analysis
    Clear,

    /// Print aggregate statistics
    Stats,

    /// Print the chronological score series
    Series,

    /// Write a session snapshot
    Export {
        /// Target directory (defaults to the platform export dir)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Replace the history with a session snapshot
    Import { file: PathBuf },

    /// Toggle ids into the comparison selection and print the resulting pair
    Compare {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Only this risk level (safe, low, medium, high)
    #[arg(long, value_parser = parse_risk)]
    pub risk: Option<Risk>,

    /// Minimum credibility score (inclusive)
    #[arg(long)]
    pub min: Option<f64>,

    /// Maximum credibility score (inclusive)
    #[arg(long)]
    pub max: Option<f64>,

    /// Case-insensitive match on title or source
    #[arg(long)]
    pub search: Option<String>,

    /// Newest first
    #[arg(long)]
    pub recent: bool,
}

fn parse_risk(raw: &str) -> Result<Risk, String> {
    Risk::parse(raw).ok_or_else(|| format!("unknown risk level `{raw}`"))
}
