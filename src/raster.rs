use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use image::RgbaImage;
use resvg::{tiny_skia, usvg};

use crate::config::{Config, RasterConfig};
use crate::quantize::quantize;
use crate::svg::square_svg;

/// Renders `svg` into a `size`x`size` pixmap, stretching the document to fill it.
pub fn render(svg: &str, size: u32, config: &RasterConfig) -> Result<tiny_skia::Pixmap> {
    let mut opt = usvg::Options::default();
    if config.system_fonts {
        Arc::make_mut(&mut opt.fontdb).load_system_fonts();
    }

    let tree = usvg::Tree::from_str(svg, &opt).context("Failed to parse SVG")?;
    let tree_size = tree.size();

    let mut pixmap = tiny_skia::Pixmap::new(size, size)
        .with_context(|| format!("Failed to create {size}x{size} pixmap"))?;
    let transform = tiny_skia::Transform::from_scale(
        size as f32 / tree_size.width(),
        size as f32 / tree_size.height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    Ok(pixmap)
}

/// Squares the SVG at `svg_path`, renders it to `png_path`, then overwrites
/// that PNG with a copy quantized to `palette` colors.
pub fn rasterize(
    svg_path: &Path,
    png_path: &Path,
    palette: u32,
    config: &Config,
) -> Result<PathBuf> {
    let text = std::fs::read_to_string(svg_path)
        .with_context(|| format!("Failed to read {}", svg_path.display()))?;
    let squared =
        square_svg(&text).with_context(|| format!("Failed to square {}", svg_path.display()))?;

    let pixmap = render(&squared, config.raster.size, &config.raster)
        .with_context(|| format!("Failed to render {}", svg_path.display()))?;
    pixmap
        .save_png(png_path)
        .with_context(|| format!("Failed to write {}", png_path.display()))?;

    let rendered = load_rgba(png_path)?;
    let quantized = quantize(&rendered, palette, config.quantize.raster)?;
    save_png(&quantized, png_path)?;

    Ok(png_path.to_path_buf())
}

pub fn load_rgba(path: &Path) -> Result<RgbaImage> {
    let img = image::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(img.to_rgba8())
}

pub fn save_png(img: &RgbaImage, path: &Path) -> Result<()> {
    img.save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("Failed to write {}", path.display()))
}
