use std::path::Path;

use palette_ico::cli::{Cli, Svg2IcoArgs};
use palette_ico::commands;
use palette_ico::config::{Config, FetchConfig};
use palette_ico::fetch::Fetcher;
use palette_ico::pack::create_ico;
use palette_ico::palette::Palette;
use palette_ico::paths::OutputPaths;
use palette_ico::quantize::count_colors;
use palette_ico::raster::{load_rgba, rasterize};
use palette_ico::summary::read_ico_frames;
use image::Rgba;
use reqwest::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const THREE_COLORS: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="64px" height="64px" viewBox="0 0 64 64">
  <rect x="0" y="0" width="32" height="32" fill="#ff0000"/>
  <rect x="32" y="0" width="32" height="32" fill="#00ff00"/>
  <circle cx="32" cy="48" r="16" fill="#0000ff"/>
</svg>"##;

/// No `#RRGGBB` literal, so the palette is just the fill plus transparent.
const SHORTHAND: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="64" height="64" viewBox="0 0 64 64">
  <circle cx="32" cy="32" r="24" fill="#f00"/>
</svg>"##;

const WIDE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="120" height="60" viewBox="0 0 120 60">
  <rect x="0" y="0" width="120" height="60" fill="#ff0000"/>
</svg>"##;

/// Answers a single HTTP request with `status` and `body`, returning the URL to hit.
async fn serve_once(status: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            if request.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }

        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: image/svg+xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
    });

    format!("http://{addr}/icon.svg")
}

/// Loopback requests must not go through an ambient HTTP(S)_PROXY.
fn direct() -> FetchConfig {
    FetchConfig {
        system_proxy: false,
        ..Default::default()
    }
}

const TEST_CONFIG: &str = "[fetch]\nsystem_proxy = false\n\n[raster]\nsystem_fonts = false\n";

fn test_config() -> Config {
    let mut config = Config::default();
    config.fetch.system_proxy = false;
    config.raster.system_fonts = false;
    config
}

#[tokio::test]
async fn download_writes_body() {
    let url = serve_once("200 OK", THREE_COLORS).await;
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("nested").join("icon.svg");

    let fetcher = Fetcher::new(&direct()).unwrap();
    let download = fetcher.download(&url, &dest).await.unwrap();

    assert_eq!(download.status, StatusCode::OK);
    assert_eq!(download.bytes, THREE_COLORS.len());
    assert_eq!(download.path, dest);
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), THREE_COLORS);
}

#[tokio::test]
async fn error_status_still_writes_body() {
    let url = serve_once("404 Not Found", "<html>missing</html>").await;
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("icon.svg");

    let fetcher = Fetcher::new(&direct()).unwrap();
    let download = fetcher.download(&url, &dest).await.unwrap();

    assert_eq!(download.status, StatusCode::NOT_FOUND);
    assert_eq!(
        std::fs::read_to_string(&dest).unwrap(),
        "<html>missing</html>"
    );

    // The failure surfaces once the body is treated as an SVG.
    let outputs = OutputPaths::new(&dest).unwrap();
    assert!(rasterize(&outputs.svg, &outputs.png, 4, &test_config()).is_err());
}

#[tokio::test]
async fn require_success_rejects_error_status() {
    let url = serve_once("500 Internal Server Error", "oops").await;
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("icon.svg");

    let fetcher = Fetcher::new(&FetchConfig {
        require_success: true,
        timeout_secs: Some(30),
        system_proxy: false,
    })
    .unwrap();
    let err = fetcher.download(&url, &dest).await.unwrap_err();

    assert!(err.to_string().contains("500"), "error: {}", err);
    assert!(!dest.exists());
}

#[tokio::test]
async fn unreachable_host_is_an_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = tempfile::tempdir().unwrap();
    let fetcher = Fetcher::new(&direct()).unwrap();
    let result = fetcher
        .download(&format!("http://{addr}/icon.svg"), &dir.path().join("icon.svg"))
        .await;
    assert!(result.is_err());
}

#[test]
fn wide_svg_is_centered_on_a_square_raster() {
    let dir = tempfile::tempdir().unwrap();
    let outputs = OutputPaths::new(&dir.path().join("wide.svg")).unwrap();
    std::fs::write(&outputs.svg, WIDE).unwrap();

    let mut config = test_config();
    config.raster.size = 256;
    let png = rasterize(&outputs.svg, &outputs.png, 4, &config).unwrap();

    let raster = load_rgba(&png).unwrap();
    assert_eq!(raster.dimensions(), (256, 256));
    // Padding bands above and below, artwork in the middle.
    assert_eq!(raster.get_pixel(128, 10)[3], 0);
    assert_eq!(raster.get_pixel(128, 245)[3], 0);
    let center = raster.get_pixel(128, 128);
    assert_eq!(center[3], 255);
    assert!(center[0] > 200 && center[1] < 50, "center pixel {:?}", center);

    // The downloaded document itself is not rewritten.
    assert_eq!(std::fs::read_to_string(&outputs.svg).unwrap(), WIDE);
}

fn assert_outputs(dir: &Path, name: &str, max_colors: usize) {
    let png = load_rgba(&dir.join(format!("{name}.png"))).unwrap();
    assert_eq!(png.dimensions(), (2048, 2048));
    assert!(count_colors(&png) <= max_colors);

    let frames = read_ico_frames(&dir.join(format!("{name}.ico"))).unwrap();
    let sizes: Vec<u32> = frames.iter().map(|f| f.width()).collect();
    assert_eq!(sizes, vec![16, 24, 32, 48, 64, 72, 80, 96, 128, 256]);
    assert!(frames.iter().all(|f| f.width() == f.height()));

    let summary = image::open(dir.join(format!("{name}-summary.png"))).unwrap();
    assert_eq!(summary.width(), 816);
    assert_eq!(summary.height(), 256);
}

#[test]
fn stages_produce_every_output() {
    let dir = tempfile::tempdir().unwrap();
    let outputs = OutputPaths::new(&dir.path().join("tiles.svg")).unwrap();
    std::fs::write(&outputs.svg, THREE_COLORS).unwrap();

    let config = test_config();
    let palette = Palette::from_svg_file(&outputs.svg).unwrap();
    assert_eq!(palette.size, 8);

    rasterize(&outputs.svg, &outputs.png, palette.size, &config).unwrap();
    let packed = create_ico(&outputs, palette.size, &config).unwrap();
    assert_eq!(packed.frames.len(), 10);

    assert_outputs(dir.path(), "tiles", 8);
}

/// Runs the `svg2ico` command against a local server serving `svg`.
async fn run_command(dir: &Path, name: &str, svg: &'static str) {
    let url = serve_once("200 OK", svg).await;

    let config_path = dir.join("palette-ico.toml");
    std::fs::write(&config_path, TEST_CONFIG).unwrap();

    let cli = Cli {
        command: None,
        config: config_path,
    };
    let args = Svg2IcoArgs {
        url,
        save_path: dir.join(format!("{name}.svg")),
    };
    commands::svg2ico::run(&cli, &args).await.unwrap();

    assert_eq!(
        std::fs::read_to_string(dir.join(format!("{name}.svg"))).unwrap(),
        svg
    );
}

#[tokio::test]
async fn svg2ico_command_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    run_command(dir.path(), "favicon", THREE_COLORS).await;
    assert_outputs(dir.path(), "favicon", 8);
}

#[test]
fn shorthand_colors_rasterize_with_transparent_background() {
    let dir = tempfile::tempdir().unwrap();
    let outputs = OutputPaths::new(&dir.path().join("dot.svg")).unwrap();
    std::fs::write(&outputs.svg, SHORTHAND).unwrap();

    let palette = Palette::from_svg_file(&outputs.svg).unwrap();
    assert_eq!(palette.source_colors(), 0);
    assert_eq!(palette.size, 2);

    let mut config = test_config();
    config.raster.size = 256;
    let png = rasterize(&outputs.svg, &outputs.png, palette.size, &config).unwrap();
    let raster = load_rgba(&png).unwrap();

    assert!(count_colors(&raster) <= 2);
    assert_eq!(*raster.get_pixel(0, 0), Rgba([0, 0, 0, 0]));
    assert_eq!(*raster.get_pixel(255, 255), Rgba([0, 0, 0, 0]));
    let center = raster.get_pixel(128, 128);
    assert!(center[0] > 200 && center[1] < 50, "center pixel {:?}", center);
    assert!(center[3] > 200, "center pixel {:?}", center);
}

#[tokio::test]
async fn svg2ico_command_with_smallest_palette() {
    let dir = tempfile::tempdir().unwrap();
    run_command(dir.path(), "dot", SHORTHAND).await;
    assert_outputs(dir.path(), "dot", 2);

    let png = load_rgba(&dir.path().join("dot.png")).unwrap();
    assert_eq!(*png.get_pixel(0, 0), Rgba([0, 0, 0, 0]));
    assert_eq!(*png.get_pixel(2047, 2047), Rgba([0, 0, 0, 0]));

    let frames = read_ico_frames(&dir.path().join("dot.ico")).unwrap();
    for frame in &frames {
        assert_eq!(frame.get_pixel(0, 0)[3], 0, "{}px corner", frame.width());
    }
}
