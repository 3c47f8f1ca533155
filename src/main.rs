// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "amms-imaging")]
#[command(about = "Still image post-processing pipelines")]
#[command(version, long_version = env!("GIT_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an image through a filter pipeline
    Process {
        /// Input image (any format the image crate decodes)
        input: PathBuf,

        /// Output file path (default: ./IMG_TIMESTAMP.<format>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Effect preset to apply; repeat to chain several
        #[arg(short, long)]
        effect: Vec<String>,

        /// Source rectangle X,Y,W,H (negative W or H mirrors)
        #[arg(long, value_parser = cli::parse_rect, allow_hyphen_values = true)]
        crop: Option<(i32, i32, i32, i32)>,

        /// Destination size WxH, after rotation
        #[arg(long, value_parser = cli::parse_size)]
        size: Option<(i32, i32)>,

        /// Clockwise quarter turns (0-3)
        #[arg(short, long)]
        rotate: Option<i32>,

        /// Image to composite on top
        #[arg(long)]
        overlay: Option<PathBuf>,

        /// Overlay position X,Y
        #[arg(
            long,
            value_parser = cli::parse_point,
            allow_hyphen_values = true,
            default_value = "0,0"
        )]
        overlay_at: (i32, i32),

        /// Overlay blending: opaque, alpha or key:RRGGBB
        #[arg(long, default_value = "opaque")]
        overlay_mode: String,

        /// Output format: png, jpeg or raw (default: from output extension, else png)
        #[arg(short, long)]
        format: Option<String>,

        /// JPEG quality (1-100)
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: Option<u8>,

        /// Processor configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List available filters and the MIME types they convert
    Filters,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG to control log level, e.g. RUST_LOG=amms_imaging=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            output,
            effect,
            crop,
            size,
            rotate,
            overlay,
            overlay_at,
            overlay_mode,
            format,
            quality,
            config,
        } => cli::process_image(
            input,
            output,
            cli::ProcessOptions {
                effects: effect,
                crop,
                size,
                rotate,
                overlay,
                overlay_at,
                overlay_mode,
                format,
                quality,
                config,
            },
        ),
        Commands::Filters => cli::list_filters(),
    }
}
