use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use ico::{IconDir, IconDirEntry, IconImage, ResourceType};
use image::{imageops, RgbaImage};

use crate::alpha_bleed::alpha_bleed;
use crate::config::{Config, IconConfig};
use crate::paths::OutputPaths;
use crate::quantize::{quantize, QuantizeMethod};
use crate::raster::{load_rgba, save_png};
use crate::summary;

#[derive(Debug)]
pub struct PackOutput {
    pub ico: PathBuf,
    pub summary: PathBuf,
    pub frames: Vec<RgbaImage>,
}

/// Shrinks `base` to every configured size and quantizes each copy on its own.
///
/// Frames come back in the order of `icon.sizes`.
pub fn build_frames(
    base: &RgbaImage,
    palette: u32,
    icon: &IconConfig,
    method: QuantizeMethod,
) -> Result<Vec<RgbaImage>> {
    let mut source = base.clone();
    if icon.bleed {
        alpha_bleed(&mut source);
    }

    let filter = icon.resample.filter();
    icon.sizes
        .iter()
        .map(|&size| {
            let resized = imageops::resize(&source, size, size, filter);
            quantize(&resized, palette, method)
                .with_context(|| format!("Failed to quantize {size}x{size} frame"))
        })
        .collect()
}

/// Writes `frames` into one ICO container, one entry per frame, in order.
pub fn write_ico(frames: &[RgbaImage], path: &Path) -> Result<()> {
    if frames.is_empty() {
        bail!("No frames to write to {}", path.display());
    }

    let mut icon_dir = IconDir::new(ResourceType::Icon);
    for frame in frames {
        let (w, h) = frame.dimensions();
        let image = IconImage::from_rgba_data(w, h, frame.as_raw().clone());
        let entry = IconDirEntry::encode(&image)
            .with_context(|| format!("Failed to encode {w}x{h} ICO entry"))?;
        icon_dir.add_entry(entry);
    }

    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    icon_dir
        .write(BufWriter::new(file))
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}

/// Builds `outputs.ico` and `outputs.summary` from the quantized raster at `outputs.png`.
pub fn create_ico(outputs: &OutputPaths, palette: u32, config: &Config) -> Result<PackOutput> {
    let base = load_rgba(&outputs.png)?;
    let frames = build_frames(&base, palette, &config.icon, config.quantize.frames)?;

    write_ico(&frames, &outputs.ico)?;
    summary::write_strip(&frames, &outputs.summary)?;

    Ok(PackOutput {
        ico: outputs.ico.clone(),
        summary: outputs.summary.clone(),
        frames,
    })
}

/// Writes every size as its own `<stem>-{N}.png` and single-frame `<stem>-{N}.ico`.
pub fn downsample_each(
    outputs: &OutputPaths,
    palette: u32,
    config: &Config,
) -> Result<Vec<PathBuf>> {
    let base = load_rgba(&outputs.png)?;
    let frames = build_frames(&base, palette, &config.icon, config.quantize.frames)?;

    let mut written = Vec::with_capacity(frames.len() * 2);
    for (&size, frame) in config.icon.sizes.iter().zip(&frames) {
        let png = outputs.frame_png(size)?;
        save_png(frame, &png)?;
        written.push(png);

        let ico = outputs.frame_ico(size)?;
        write_ico(std::slice::from_ref(frame), &ico)?;
        written.push(ico);
    }

    Ok(written)
}
