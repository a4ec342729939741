// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "depth-layers")]
#[command(about = "Split depth+color frames into room and near/far person layers")]
#[command(version = env!("BUILD_VERSION"))]
struct Cli {
    /// JSON settings file (defaults apply to missing fields)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Near/far cutoff in millimeters (overrides the settings file)
    #[arg(short, long, global = true)]
    threshold: Option<u32>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Process synthetic frames and save the final layers as PNG
    Run {
        /// Number of frames to process
        #[arg(short, long, default_value = "90")]
        frames: u64,

        /// Output directory (default: ./layers_TIMESTAMP)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the processing loop and print the depth readout until Ctrl+C
    Watch,

    /// Print the effective settings as JSON
    Config,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=depth_layers=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let config = cli::load_config(cli.config.as_deref(), cli.threshold)?;

    match cli.command {
        Some(Commands::Run { frames, output }) => cli::run_frames(config, frames, output),
        Some(Commands::Watch) => cli::watch(config),
        Some(Commands::Config) => cli::print_config(&config),
        None => cli::run_frames(config, 90, None),
    }
}
