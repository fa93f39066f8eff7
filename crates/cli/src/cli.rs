use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "burstdng")]
#[command(author, version, about = "Batch-convert camera raw bursts to DNG with dnglab")]
pub struct Cli {
    /// Path to the preferences file
    #[arg(long, global = true, value_name = "FILE")]
    pub prefs: Option<PathBuf>,

    /// Enable debug logging and show dnglab output for every file
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert raw files (or folders of raw files) to DNG
    Convert(ConvertArgs),

    /// Show or change saved preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },

    /// Check that dnglab is available and print its version
    Check {
        /// dnglab executable to check instead of the configured one
        #[arg(long, value_name = "PATH")]
        dnglab: Option<PathBuf>,
    },
}

#[derive(Args)]
pub struct ConvertArgs {
    /// Raw files or folders to convert, in order
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output folder (defaults to the saved output folder)
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Base name for the DNG files
    #[arg(short, long, default_value = "output")]
    pub name: String,

    /// Maximum number of dnglab processes running at once
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// dnglab executable (defaults to the saved one)
    #[arg(long, value_name = "PATH")]
    pub dnglab: Option<PathBuf>,

    /// Kill a conversion after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Extensions picked up when scanning folders
    #[arg(long = "ext", value_name = "EXT", value_delimiter = ',')]
    pub extensions: Vec<String>,

    /// Print events as JSON lines instead of status text
    #[arg(long)]
    pub json: bool,

    /// Write Prometheus metrics to this file when the run ends
    #[arg(long, value_name = "FILE")]
    pub metrics: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum PrefsAction {
    /// Print the effective preferences
    Show,

    /// Change and save preferences
    Set {
        /// dnglab executable
        #[arg(long, value_name = "PATH")]
        dnglab: Option<PathBuf>,

        /// Default output folder
        #[arg(long, value_name = "DIR")]
        output_folder: Option<PathBuf>,

        /// Default maximum number of parallel conversions
        #[arg(long, value_name = "N")]
        max_jobs: Option<usize>,

        /// Per-conversion timeout in seconds (0 clears it)
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },

    /// Print the preferences file location
    Path,
}
