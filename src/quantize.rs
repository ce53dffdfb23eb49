//! Palette reduction on top of libimagequant.
//!
//! Both passes of the pipeline go through [`quantize`]; they differ only in
//! the [`QuantizeMethod`], which decides how much error diffusion is applied
//! when pixels are remapped onto the palette.

use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::palette::TRANSPARENT;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantizeMethod {
    /// Nearest palette color, no dithering.
    #[default]
    Plain,
    /// Floyd-Steinberg dithering at full strength.
    Dithered,
}

impl QuantizeMethod {
    fn dithering_level(self) -> f32 {
        match self {
            QuantizeMethod::Plain => 0.0,
            QuantizeMethod::Dithered => 1.0,
        }
    }
}

impl std::fmt::Display for QuantizeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuantizeMethod::Plain => write!(f, "plain"),
            QuantizeMethod::Dithered => write!(f, "dithered"),
        }
    }
}

/// Reduces `img` to at most `colors` distinct RGBA values.
///
/// One of the `colors` slots is always [`TRANSPARENT`], so fully transparent
/// pixels stay exactly `(0, 0, 0, 0)`. The result has the same dimensions as
/// the input; every pixel is an entry of the generated palette.
pub fn quantize(img: &RgbaImage, colors: u32, method: QuantizeMethod) -> Result<RgbaImage> {
    let (w, h) = img.dimensions();

    let pixels: Vec<imagequant::RGBA> = img
        .pixels()
        .map(|p| imagequant::RGBA {
            r: p[0],
            g: p[1],
            b: p[2],
            a: p[3],
        })
        .collect();

    let mut liq = imagequant::new();
    liq.set_max_colors(colors)
        .with_context(|| format!("Invalid palette size: {}", colors))?;

    let mut liq_image = liq
        .new_image(pixels, w as usize, h as usize, 0.0)
        .context("Failed to prepare image for quantization")?;
    let [r, g, b, a] = TRANSPARENT;
    liq_image
        .add_fixed_color(imagequant::RGBA { r, g, b, a })
        .context("Failed to reserve the transparent palette entry")?;

    let mut res = liq
        .quantize(&mut liq_image)
        .with_context(|| format!("Failed to quantize {}x{} image", w, h))?;
    res.set_dithering_level(method.dithering_level())
        .context("Failed to set dithering level")?;

    let (palette, indices) = res
        .remapped(&mut liq_image)
        .context("Failed to remap image onto palette")?;

    let mut out = RgbaImage::new(w, h);
    for (pixel, &index) in out.pixels_mut().zip(indices.iter()) {
        let color = palette[index as usize];
        *pixel = Rgba([color.r, color.g, color.b, color.a]);
    }

    Ok(out)
}

/// Number of distinct RGBA values in `img`.
pub fn count_colors(img: &RgbaImage) -> usize {
    img.pixels()
        .map(|p| p.0)
        .collect::<std::collections::HashSet<_>>()
        .len()
}
