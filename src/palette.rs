//! Palette sizing from the color literals embedded in an SVG document.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{bail, Context, Result};
use regex::Regex;

/// Largest palette an ICO frame (and libimagequant) supports.
pub const MAX_PALETTE: u32 = 256;

/// Reserved fully transparent entry added to every palette.
pub const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#[0-9a-fA-F]{6}").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    /// One entry per unique literal found in the document, followed by [`TRANSPARENT`].
    pub colors: Vec<[u8; 4]>,
    pub size: u32,
}

impl Palette {
    pub fn from_svg(text: &str) -> Result<Self> {
        // Literals are deduplicated as written, so "#ff0000" and "#FF0000" count twice.
        let unique: BTreeSet<&str> = extract_hex_colors(text).into_iter().collect();

        let mut colors: Vec<[u8; 4]> = unique
            .into_iter()
            .map(hex_to_rgba)
            .collect::<Result<_>>()?;
        colors.push(TRANSPARENT);

        let size = palette_size(colors.len());
        Ok(Self { colors, size })
    }

    pub fn from_svg_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_svg(&text).with_context(|| format!("Failed to scan colors in {}", path.display()))
    }

    /// Number of colors found in the document, excluding the transparent entry.
    pub fn source_colors(&self) -> usize {
        self.colors.len() - 1
    }
}

/// Every `#RRGGBB` literal in `text`, in document order, duplicates included.
///
/// Only the first six digits of a longer run are taken, so `#AABBCCDD`
/// yields `#AABBCC`. Three-digit shorthand is not matched.
pub fn extract_hex_colors(text: &str) -> Vec<&str> {
    HEX_COLOR.find_iter(text).map(|m| m.as_str()).collect()
}

/// Parses `#RRGGBB` or `#RRGGBBAA` into RGBA. Alpha defaults to 255.
pub fn hex_to_rgba(hex: &str) -> Result<[u8; 4]> {
    let digits = hex.trim_start_matches('#');
    if !matches!(digits.len(), 6 | 8) || !digits.is_ascii() {
        bail!("Unsupported hex color: {}", hex);
    }

    let mut rgba = [0, 0, 0, 255];
    for (slot, i) in rgba.iter_mut().zip((0..digits.len()).step_by(2)) {
        *slot = u8::from_str_radix(&digits[i..i + 2], 16)
            .with_context(|| format!("Invalid hex color: {}", hex))?;
    }

    Ok(rgba)
}

/// Palette size for `count` colors (transparent entry included).
///
/// Takes the smallest power of two that fits `count` and doubles it once,
/// capped at [`MAX_PALETTE`].
pub fn palette_size(count: usize) -> u32 {
    let fit = count.clamp(1, MAX_PALETTE as usize).next_power_of_two() as u32;
    (fit * 2).min(MAX_PALETTE)
}
