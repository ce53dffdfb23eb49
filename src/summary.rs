//! Diagnostic strip showing every icon frame side by side.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{bail, Context, Result};
use ico::IconDir;
use image::{imageops, RgbaImage};

use crate::raster::save_png;

/// Concatenates `frames` left to right, top-aligned.
///
/// Width is the sum of the frame widths, height the tallest frame.
pub fn strip(frames: &[RgbaImage]) -> RgbaImage {
    let width = frames.iter().map(|f| f.width()).sum();
    let height = frames.iter().map(|f| f.height()).max().unwrap_or(0);

    let mut canvas = RgbaImage::new(width, height);
    let mut x = 0i64;
    for frame in frames {
        imageops::replace(&mut canvas, frame, x, 0);
        x += frame.width() as i64;
    }
    canvas
}

pub fn write_strip(frames: &[RgbaImage], path: &Path) -> Result<()> {
    if frames.is_empty() {
        bail!("No frames to combine into {}", path.display());
    }
    save_png(&strip(frames), path)
}

/// Decodes every frame of an existing ICO file, in entry order.
pub fn read_ico_frames(ico_path: &Path) -> Result<Vec<RgbaImage>> {
    let file =
        File::open(ico_path).with_context(|| format!("Failed to open {}", ico_path.display()))?;
    let icon_dir = IconDir::read(BufReader::new(file))
        .with_context(|| format!("Failed to parse {}", ico_path.display()))?;

    icon_dir
        .entries()
        .iter()
        .map(|entry| {
            let image = entry.decode().with_context(|| {
                format!(
                    "Failed to decode {}x{} frame of {}",
                    entry.width(),
                    entry.height(),
                    ico_path.display()
                )
            })?;
            RgbaImage::from_raw(image.width(), image.height(), image.rgba_data().to_vec())
                .context("ICO frame has inconsistent pixel data")
        })
        .collect()
}

/// Writes the strip for the frames of an existing ICO file.
pub fn combine_ico(ico_path: &Path, output_path: &Path) -> Result<()> {
    let frames = read_ico_frames(ico_path)?;
    write_strip(&frames, output_path)
}
