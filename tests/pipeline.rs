//! End-to-end export scenarios: decode, color, sort, lay out and paint.

use std::io::Cursor;

use album_grid_wasm::{
    ClusterConfig, FALLBACK_COLOR, MemorySampler, MosaicConfig, TileStatus, compose,
    compose_canvas_files,
};
use futures::executor::block_on;
use image::{ImageFormat, Rgba, RgbaImage};

fn solid_png(w: u32, h: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = RgbaImage::from_pixel(w, h, Rgba([rgb[0], rgb[1], rgb[2], 255]));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
    buf
}

fn locators(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn small_grid(rows: u32, cols: u32) -> MosaicConfig {
    MosaicConfig { canvas_extent: 64, seed: Some(2024), ..MosaicConfig::new(rows, cols) }
}

fn close(a: Rgba<u8>, b: Rgba<u8>) -> bool {
    a.0.iter().zip(b.0.iter()).all(|(x, y)| x.abs_diff(*y) <= 1)
}

#[test]
fn failed_images_are_kept_black_and_sorted_last() {
    let sampler = MemorySampler::new()
        .with("blue", solid_png(8, 8, [0, 0, 255]))
        .with("corrupt", b"\x89PNG but not really".to_vec())
        .with("yellow", solid_png(8, 8, [255, 255, 0]));
    let inputs = locators(&["missing", "blue", "corrupt", "yellow"]);

    let composite = block_on(compose(&sampler, &inputs, &small_grid(2, 2))).unwrap();

    let order: Vec<&str> = composite.placements.iter().map(|p| p.locator.as_str()).collect();
    assert_eq!(order, ["yellow", "blue", "missing", "corrupt"]);
    assert_eq!(composite.colors(), ["#ffff00", "#0000ff", FALLBACK_COLOR, FALLBACK_COLOR]);

    let statuses: Vec<TileStatus> = composite.placements.iter().map(|p| p.status).collect();
    assert_eq!(
        statuses,
        [
            TileStatus::Extracted,
            TileStatus::Extracted,
            TileStatus::DecodeFailed,
            TileStatus::DecodeFailed
        ]
    );

    let cells: Vec<(u32, u32)> = composite.placements.iter().map(|p| (p.row, p.col)).collect();
    assert_eq!(cells, [(0, 0), (0, 1), (1, 0), (1, 1)]);

    let canvas = &composite.canvas;
    assert_eq!(canvas.dimensions(), (64, 64));
    assert!(close(*canvas.get_pixel(16, 16), Rgba([255, 255, 0, 255])));
    assert!(close(*canvas.get_pixel(48, 16), Rgba([0, 0, 255, 255])));
    assert_eq!(*canvas.get_pixel(16, 48), Rgba([0, 0, 0, 255]));
    assert_eq!(*canvas.get_pixel(48, 48), Rgba([0, 0, 0, 255]));
}

#[test]
fn solid_red_cover_is_red() {
    let sampler = MemorySampler::new().with("red", solid_png(20, 20, [255, 0, 0]));
    let config = MosaicConfig { clusters: ClusterConfig::with_k(5), ..small_grid(1, 1) };
    let composite = block_on(compose(&sampler, &locators(&["red"]), &config)).unwrap();
    assert_eq!(composite.colors(), ["#ff0000"]);
}

#[test]
fn extraction_failures_keep_input_order_and_artwork() {
    let sampler = MemorySampler::new()
        .with("a", solid_png(4, 4, [0, 200, 0]))
        .with("b", solid_png(4, 4, [200, 0, 200]));
    let config = MosaicConfig { clusters: ClusterConfig::with_k(0), ..small_grid(1, 2) };

    let composite = block_on(compose(&sampler, &locators(&["a", "b"]), &config)).unwrap();

    let order: Vec<&str> = composite.placements.iter().map(|p| p.locator.as_str()).collect();
    assert_eq!(order, ["a", "b"]);
    assert!(composite.placements.iter().all(|p| p.status == TileStatus::ExtractionFailed));
    assert!(composite.placements.iter().all(|p| p.color == FALLBACK_COLOR));
    // The covers themselves are still drawn.
    assert!(close(*composite.canvas.get_pixel(10, 10), Rgba([0, 200, 0, 255])));
}

#[test]
fn same_seed_gives_same_export() {
    let sampler = MemorySampler::new()
        .with("x", solid_png(6, 6, [30, 140, 220]))
        .with("y", solid_png(6, 6, [240, 180, 20]));
    let inputs = locators(&["x", "y"]);
    let a = block_on(compose(&sampler, &inputs, &small_grid(1, 2))).unwrap();
    let b = block_on(compose(&sampler, &inputs, &small_grid(1, 2))).unwrap();
    assert_eq!(a.placements, b.placements);
    assert_eq!(a.to_png().unwrap(), b.to_png().unwrap());
}

#[test]
fn layout_report_serializes_failures() {
    let sampler = MemorySampler::new();
    let composite = block_on(compose(&sampler, &locators(&["gone"]), &small_grid(1, 1))).unwrap();
    let json = serde_json::to_value(&composite.placements).unwrap();
    assert_eq!(json[0]["status"], "decode_failed");
    assert_eq!(json[0]["color"], "#000000");
    assert!(json[0]["error"].as_str().unwrap().contains("gone"));
}

#[test]
fn files_on_disk_compose_with_missing_paths() {
    let dir = std::env::temp_dir().join(format!("album-grid-it-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let white = dir.join("white.png");
    std::fs::write(&white, solid_png(5, 5, [255, 255, 255])).unwrap();
    let missing = dir.join("missing.png");

    let composite =
        compose_canvas_files(&[missing.clone(), white.clone()], &small_grid(1, 2)).unwrap();
    std::fs::remove_dir_all(&dir).unwrap();

    assert_eq!(composite.colors(), ["#ffffff", FALLBACK_COLOR]);
    assert_eq!(composite.placements[1].locator, missing.to_string_lossy());
    assert_eq!(composite.placements[1].status, TileStatus::DecodeFailed);
}
