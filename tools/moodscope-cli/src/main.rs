//! MoodScope CLI: command-line interface for session analysis.
//!
//! Usage:
//!   moodscope analyze <SESSION>    Analyze a session and write the report
//!   moodscope validate <SESSION>   Validate a session bundle
//!   moodscope info <SESSION>       Show session information
//!   moodscope render <SNAPSHOT>    Re-render a text report from a JSON snapshot

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use moodscope_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "moodscope",
    about = "Heuristic activity and facial expression analysis of video sessions",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a session and export the text and JSON reports
    Analyze {
        /// Path to the session directory
        session: PathBuf,

        /// Output directory (defaults to the configured output directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// File stem for the report artifacts
        #[arg(long)]
        name: Option<String>,

        /// Stop after this many frames
        #[arg(long)]
        max_frames: Option<u64>,
    },

    /// Validate a session bundle
    Validate {
        /// Path to the session directory
        session: PathBuf,
    },

    /// Show session information
    Info {
        /// Path to the session directory
        session: PathBuf,
    },

    /// Render the text report from a JSON snapshot
    Render {
        /// Path to a snapshot written by `analyze`
        snapshot: PathBuf,

        /// Write the text report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load();
    config.validate()?;

    // Initialize logging
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    moodscope_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Analyze {
            session,
            output,
            name,
            max_frames,
        } => commands::analyze::run(
            session,
            output.unwrap_or_else(|| config.output_dir.clone()),
            name.unwrap_or_else(|| config.report.name.clone()),
            max_frames,
            &config,
        ),
        Commands::Validate { session } => commands::validate::run(session),
        Commands::Info { session } => commands::info::run(session, &config),
        Commands::Render { snapshot, output } => commands::render::run(snapshot, output),
    }
}
