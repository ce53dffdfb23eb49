use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Files produced next to the downloaded SVG, derived by swapping its extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub svg: PathBuf,
    pub png: PathBuf,
    pub ico: PathBuf,
    pub summary: PathBuf,
}

impl OutputPaths {
    pub fn new(svg: &Path) -> Result<Self> {
        let png = svg.with_extension("png");
        let ico = svg.with_extension("ico");
        if png == svg || ico == svg {
            bail!(
                "Save path {} would be overwritten by its own outputs; use an .svg extension",
                svg.display()
            );
        }

        let summary = sibling(svg, "-summary.png")?;

        Ok(Self {
            svg: svg.to_path_buf(),
            png,
            ico,
            summary,
        })
    }

    /// `<stem>-{size}.png`
    pub fn frame_png(&self, size: u32) -> Result<PathBuf> {
        sibling(&self.svg, &format!("-{size}.png"))
    }

    /// `<stem>-{size}.ico`
    pub fn frame_ico(&self, size: u32) -> Result<PathBuf> {
        sibling(&self.svg, &format!("-{size}.ico"))
    }
}

fn sibling(path: &Path, suffix: &str) -> Result<PathBuf> {
    let stem = path
        .file_stem()
        .with_context(|| format!("{} has no file name", path.display()))?;

    let mut name = stem.to_os_string();
    name.push(suffix);
    Ok(path.with_file_name(name))
}
