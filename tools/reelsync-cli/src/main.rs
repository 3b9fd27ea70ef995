//! Reelsync CLI: headless driver for the timeline engine.
//!
//! Usage:
//!   reelsync init <NAME>                      Create an empty project file
//!   reelsync add <PROJECT> <MEDIA>            Probe a media file and place it
//!   reelsync info <PROJECT>                   Show project information
//!   reelsync frame <PROJECT> --at <SECS>      Render one preview frame to PNG
//!   reelsync scrub <PROJECT> --from --to      Simulate a playhead drag
//!   reelsync check                            Check external tools and config

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use reelsync_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "reelsync",
    about = "Timeline playhead synchronisation and preview rendering",
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
    /// Create a new empty project
    Init {
        /// Project name
        name: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Preview width
        #[arg(long, default_value = "1920")]
        width: u32,

        /// Preview height
        #[arg(long, default_value = "1080")]
        height: u32,

        /// Project frame rate
        #[arg(long, default_value = "30")]
        fps: f64,
    },

    /// Probe a media file and add it to a project as a clip
    Add {
        /// Path to the project file
        project: PathBuf,

        /// Media file to place
        media: PathBuf,

        /// Track index
        #[arg(long, default_value = "0")]
        track: u32,

        /// Start time in seconds (defaults to the end of the track)
        #[arg(long)]
        at: Option<f64>,
    },

    /// Show project information
    Info {
        /// Path to the project file
        project: PathBuf,

        /// Print the raw project JSON
        #[arg(long)]
        json: bool,
    },

    /// Render the composited frame at one timeline instant
    Frame {
        /// Path to the project file
        project: PathBuf,

        /// Timeline time in seconds
        #[arg(long, default_value = "0.0")]
        at: f64,

        /// Output PNG path
        #[arg(short, long, default_value = "frame.png")]
        out: PathBuf,

        /// Seconds to wait for the render
        #[arg(long, default_value = "30")]
        timeout_secs: u64,
    },

    /// Drag the playhead across a range and report renderer behaviour
    Scrub {
        /// Path to the project file
        project: PathBuf,

        /// Scrub start (seconds)
        #[arg(long, default_value = "0.0")]
        from: f64,

        /// Scrub end (seconds)
        #[arg(long)]
        to: f64,

        /// Number of pointer moves between start and end
        #[arg(long, default_value = "60")]
        steps: u32,

        /// UI tick interval in milliseconds
        #[arg(long, default_value = "16")]
        tick_ms: u64,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check external tools and configuration
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load();

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    reelsync_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Init {
            name,
            output,
            width,
            height,
            fps,
        } => commands::init::run(name, output, width, height, fps),
        Commands::Add {
            project,
            media,
            track,
            at,
        } => commands::add::run(&config, project, media, track, at),
        Commands::Info { project, json } => commands::info::run(project, json),
        Commands::Frame {
            project,
            at,
            out,
            timeout_secs,
        } => commands::frame::run(config, project, at, out, timeout_secs),
        Commands::Scrub {
            project,
            from,
            to,
            steps,
            tick_ms,
            json,
        } => commands::scrub::run(config, project, from, to, steps, tick_ms, json).await,
        Commands::Check => commands::check::run(&config),
    }
}
