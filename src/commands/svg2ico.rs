use anyhow::Result;
use colored::Colorize;

use crate::cli::{Cli, Svg2IcoArgs};
use crate::config::Config;
use crate::fetch::Fetcher;
use crate::pack;
use crate::palette::Palette;
use crate::paths::OutputPaths;
use crate::quantize::count_colors;
use crate::raster;

pub async fn run(cli: &Cli, args: &Svg2IcoArgs) -> Result<()> {
    let config = Config::load_or_default(&cli.config)?;
    let outputs = OutputPaths::new(&args.save_path)?;

    let fetcher = Fetcher::new(&config.fetch)?;
    print!("  Downloading {}...", args.url);
    let download = fetcher.download(&args.url, &outputs.svg).await?;
    println!(" {} ({} bytes)", "done".green(), download.bytes);

    if !download.status.is_success() {
        println!(
            "{} Server returned {}; the saved body may not be an SVG",
            "!".yellow(),
            download.status
        );
    }

    let palette = Palette::from_svg_file(&download.path)?;
    let palette_size = config.quantize.palette.unwrap_or(palette.size);
    println!(
        "{} Found {} colors, palette size {}{}",
        "✓".green(),
        palette.source_colors(),
        palette_size,
        if config.quantize.palette.is_some() {
            " (configured)"
        } else {
            ""
        }
    );

    print!("  Rasterizing {}...", outputs.svg.display());
    let png = raster::rasterize(&outputs.svg, &outputs.png, palette_size, &config)?;
    let colors = count_colors(&raster::load_rgba(&png)?);
    println!(" {} ({} colors)", "done".green(), colors);

    print!("  Packing {} sizes...", config.icon.sizes.len());
    let packed = pack::create_ico(&outputs, palette_size, &config)?;
    println!(" {}", "done".green());

    println!("{} Generated {}", "✓".green(), png.display().to_string().bold());
    println!(
        "{} Generated {}",
        "✓".green(),
        packed.ico.display().to_string().bold()
    );
    println!(
        "{} Generated {}",
        "✓".green(),
        packed.summary.display().to_string().bold()
    );

    Ok(())
}
