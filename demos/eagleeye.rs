//! eagleeye point cloud viewer
//!
//! Opens a window and shows a `.txt` coordinate list or an ASCII `.ply`
//! file, loaded from disk or over HTTP.
//!
//! Controls:
//!   Left drag      orbit
//!   Right drag     pan the camera (also Shift/Ctrl + left drag)
//!   Middle drag    move the cloud
//!   Wheel          zoom
//!   Space          toggle rotation
//!   R              reset camera
//!   C              cycle colour mode
//!   + / -          point size
//!   O              open file
//!   E / Shift+E    export TXT / PLY
//!   F              fullscreen
//!   Esc            quit

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use eagleeye_core::{ColorMode, ViewerConfig, ViewerParameters};
use eagleeye_visualization::{run_viewer, LoadSource};

#[derive(Parser)]
#[command(name = "eagleeye")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Interactive point cloud viewer for TXT and PLY files")]
struct Cli {
    /// File path or http(s) URL to load on startup
    source: Option<String>,

    /// JSON viewer configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Initial point size (0.01 - 0.10)
    #[arg(long)]
    point_size: Option<f32>,

    /// Colour mode: original, height, distance or uniform
    #[arg(long)]
    color_mode: Option<String>,

    /// Colour for uniform mode, as #rrggbb
    #[arg(long)]
    uniform_color: Option<String>,

    /// Start with the cloud rotating
    #[arg(long)]
    animate: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ViewerConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ViewerConfig::default(),
    };

    let mut params = ViewerParameters::default();
    if let Some(size) = cli.point_size {
        params.set_point_size(size);
    }
    if let Some(mode) = &cli.color_mode {
        params.color_mode = ColorMode::from(mode.as_str());
        if params.color_mode == ColorMode::Fallback {
            log::warn!("Unknown colour mode '{}', points will be white", mode);
        }
    }
    if let Some(hex) = &cli.uniform_color {
        if !params.set_uniform_color_hex(hex) {
            bail!("Invalid uniform colour '{}', expected #rrggbb", hex);
        }
    }
    params.is_animating = cli.animate;

    let source = cli.source.as_deref().map(LoadSource::from_location);
    run_viewer(config, params, source).context("Viewer failed")?;
    Ok(())
}
