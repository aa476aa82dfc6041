//! Convert point clouds between the coordinate-list and PLY formats
//!
//! The format of each side is chosen by file suffix: `.ply` is PLY, anything
//! else is a coordinate list.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use eagleeye_io::{read_point_set, write_point_set, Format};

#[derive(Parser)]
#[command(name = "cloud_convert")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Convert point clouds between TXT and PLY")]
struct Cli {
    /// Input file
    input: PathBuf,

    /// Output file
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let points = read_point_set(&cli.input)
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;
    if points.is_empty() {
        log::warn!("{} contains no points, nothing written", cli.input.display());
        return Ok(());
    }

    write_point_set(&points, &cli.output)
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;

    log::info!(
        "Converted {} points: {} ({:?}) -> {} ({:?})",
        points.len(),
        cli.input.display(),
        Format::from_path(&cli.input),
        cli.output.display(),
        Format::from_path(&cli.output)
    );
    Ok(())
}
