//! Sitesmith CLI - builds a multilingual static site from Firestore content.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "sitesmith")]
#[command(about = "Builds a multilingual static site from Firestore content")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to sitesmith.toml config file
    #[arg(short, long, default_value = "sitesmith.toml", global = true)]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scaffold a config, templates and a sample snapshot
    Init {
        /// Overwrite existing files
        #[arg(short, long)]
        yes: bool,
    },

    /// Fetch content and build the static site
    Build {
        /// Output directory (defaults to config or "build_output")
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Read content from a JSON snapshot instead of Firestore
        #[arg(short, long)]
        snapshot: Option<PathBuf>,

        /// Build an empty site when content cannot be fetched
        #[arg(long)]
        lenient: bool,
    },

    /// Preview the built site
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// Directory to serve (defaults to the configured output)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Do not open browser
        #[arg(long)]
        no_open: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    // Execute command
    match cli.command {
        Commands::Init { yes } => {
            commands::init::run(&cli.config, yes).await?;
        }
        Commands::Build {
            output,
            snapshot,
            lenient,
        } => {
            let overrides = commands::build::Overrides {
                output,
                snapshot,
                lenient,
            };
            commands::build::run(&cli.config, overrides).await?;
        }
        Commands::Serve { port, dir, no_open } => {
            commands::serve::run(&cli.config, port, dir, !no_open).await?;
        }
    }

    Ok(())
}
