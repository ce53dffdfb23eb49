use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::CONFIG_NAME;

#[derive(Parser)]
#[command(
    name = "palette-ico",
    about = "Convert a remote SVG icon into a multi-resolution, palette-reduced ICO file"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to config file (optional; defaults apply when it does not exist)
    #[arg(long, global = true, default_value = CONFIG_NAME)]
    pub config: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download an SVG and convert it to a multi-resolution ICO
    #[command(
        long_about = "\
Download an SVG and convert it to a multi-resolution ICO.

Writes next to <SAVE_PATH>:
  <name>.svg           the downloaded document, unmodified
  <name>.png           2048x2048 raster quantized to the palette
  <name>.ico           frames at 16, 24, 32, 48, 64, 72, 80, 96, 128 and 256 px
  <name>-summary.png   every frame side by side"
    )]
    Svg2ico(Svg2IcoArgs),
}

#[derive(Args, Debug, Clone)]
pub struct Svg2IcoArgs {
    /// URL of the SVG file to download
    pub url: String,

    /// Local path to save the SVG file
    pub save_path: PathBuf,
}
