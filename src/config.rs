use std::path::Path;

use anyhow::{bail, Context, Result};
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use crate::quantize::QuantizeMethod;

pub const CONFIG_NAME: &str = "palette-ico.toml";

/// Edge lengths of the frames written to the ICO container, ascending.
pub const DEFAULT_ICON_SIZES: [u32; 10] = [16, 24, 32, 48, 64, 72, 80, 96, 128, 256];

pub const DEFAULT_RASTER_SIZE: u32 = 2048;

#[derive(Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub raster: RasterConfig,

    #[serde(default)]
    pub quantize: QuantizeConfig,

    #[serde(default)]
    pub icon: IconConfig,
}

#[derive(Debug, PartialEq, Deserialize, Serialize)]
pub struct FetchConfig {
    /// Treat a non-success HTTP status as an error instead of writing the body
    #[serde(default)]
    pub require_success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Honor HTTP(S)_PROXY / NO_PROXY from the environment (default: true)
    #[serde(default = "default_true")]
    pub system_proxy: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            require_success: false,
            timeout_secs: None,
            system_proxy: true,
        }
    }
}

#[derive(Debug, PartialEq, Deserialize, Serialize)]
pub struct RasterConfig {
    /// Edge length of the base raster (default: 2048)
    #[serde(default = "default_raster_size")]
    pub size: u32,

    /// Load system fonts so `<text>` elements render (default: true)
    #[serde(default = "default_true")]
    pub system_fonts: bool,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_RASTER_SIZE,
            system_fonts: true,
        }
    }
}

#[derive(Debug, PartialEq, Deserialize, Serialize)]
pub struct QuantizeConfig {
    /// Method for the base raster (default: "plain")
    #[serde(default)]
    pub raster: QuantizeMethod,

    /// Method for every resized icon frame (default: "dithered")
    #[serde(default = "default_frame_method")]
    pub frames: QuantizeMethod,

    /// Fixed palette size; overrides the size computed from the SVG colors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub palette: Option<u32>,
}

impl Default for QuantizeConfig {
    fn default() -> Self {
        Self {
            raster: QuantizeMethod::Plain,
            frames: default_frame_method(),
            palette: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Resample {
    Nearest,
    Triangle,
    #[default]
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl Resample {
    pub fn filter(self) -> FilterType {
        match self {
            Resample::Nearest => FilterType::Nearest,
            Resample::Triangle => FilterType::Triangle,
            Resample::CatmullRom => FilterType::CatmullRom,
            Resample::Gaussian => FilterType::Gaussian,
            Resample::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

#[derive(Debug, PartialEq, Deserialize, Serialize)]
pub struct IconConfig {
    #[serde(default = "default_icon_sizes")]
    pub sizes: Vec<u32>,

    /// Resampling filter used when shrinking the base raster (default: "catmullrom")
    #[serde(default)]
    pub resample: Resample,

    /// Apply alpha bleed before resizing (default: true)
    #[serde(default = "default_true")]
    pub bleed: bool,
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            sizes: default_icon_sizes(),
            resample: Resample::default(),
            bleed: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_raster_size() -> u32 {
    DEFAULT_RASTER_SIZE
}

fn default_frame_method() -> QuantizeMethod {
    QuantizeMethod::Dithered
}

fn default_icon_sizes() -> Vec<u32> {
    DEFAULT_ICON_SIZES.to_vec()
}

impl Config {
    /// Load the config at `path`, falling back to defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config {}", path.display()))?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.raster.size == 0 {
            bail!("raster.size must be at least 1");
        }

        if let Some(palette) = self.quantize.palette {
            if !(2..=256).contains(&palette) {
                bail!("quantize.palette must be between 2 and 256, got {}", palette);
            }
        }

        let sizes = &self.icon.sizes;
        if sizes.is_empty() {
            bail!("icon.sizes must not be empty");
        }
        for &size in sizes {
            if !(1..=256).contains(&size) {
                bail!("icon.sizes: {} is outside the ICO range 1..=256", size);
            }
        }
        if let Some(pair) = sizes.windows(2).find(|pair| pair[0] >= pair[1]) {
            bail!(
                "icon.sizes must be strictly ascending ({} is followed by {})",
                pair[0],
                pair[1]
            );
        }

        Ok(())
    }
}
