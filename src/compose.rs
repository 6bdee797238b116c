//! Settling every tile, ordering by brightness and painting the canvas.

use std::io::Cursor;

use futures::future::join_all;
use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::color::{FALLBACK_COLOR, brightness, parse_hex};
use crate::config::{ClusterConfig, MosaicConfig};
use crate::dominant::dominant_color;
use crate::error::{ExtractionError, MosaicError, Result, SampleError};
use crate::sampler::ImageSampler;

/// How a tile got its color.
#[derive(Debug)]
pub enum TileOutcome {
    /// The dominant color was computed.
    Extracted,
    /// The image never loaded; the tile is painted with the fallback color.
    DecodeFailed(SampleError),
    /// The image loaded but no dominant color came out of it.
    ExtractionFailed(ExtractionError),
}

impl TileOutcome {
    pub fn status(&self) -> TileStatus {
        match self {
            TileOutcome::Extracted => TileStatus::Extracted,
            TileOutcome::DecodeFailed(_) => TileStatus::DecodeFailed,
            TileOutcome::ExtractionFailed(_) => TileStatus::ExtractionFailed,
        }
    }

    fn message(&self) -> Option<String> {
        match self {
            TileOutcome::Extracted => None,
            TileOutcome::DecodeFailed(e) => Some(e.to_string()),
            TileOutcome::ExtractionFailed(e) => Some(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TileStatus {
    Extracted,
    DecodeFailed,
    ExtractionFailed,
}

/// One input image with the color that orders it.
#[derive(Debug)]
pub struct ImageTile {
    pub locator: String,
    /// `None` when the image failed to load.
    pub image: Option<RgbaImage>,
    /// `#rrggbb`; [`FALLBACK_COLOR`] unless `outcome` is `Extracted`.
    pub color: String,
    pub brightness: f64,
    pub outcome: TileOutcome,
}

impl ImageTile {
    fn new(locator: &str, image: Option<RgbaImage>, color: String, outcome: TileOutcome) -> Self {
        debug_assert!(brightness(&color).is_ok(), "tile color {color} is not #rrggbb");
        let brightness = brightness(&color).unwrap_or_else(|e| {
            warn!(locator, error = %e, "unparseable tile color, sorting as black");
            0.0
        });
        Self { locator: locator.to_string(), image, color, brightness, outcome }
    }

    fn fallback(locator: &str, image: Option<RgbaImage>, outcome: TileOutcome) -> Self {
        Self::new(locator, image, FALLBACK_COLOR.to_string(), outcome)
    }

    pub fn is_fallback(&self) -> bool {
        !matches!(self.outcome, TileOutcome::Extracted)
    }
}

/// Load one locator and compute its dominant color. Never fails: load and
/// extraction errors are folded into the returned tile.
pub async fn settle_tile<S: ImageSampler>(
    sampler: &S,
    locator: &str,
    clusters: &ClusterConfig,
    seed: u64,
) -> ImageTile {
    let image = match sampler.sample(locator).await {
        Ok(image) => image,
        Err(e) => {
            warn!(locator, error = %e, "image failed to load, using fallback color");
            return ImageTile::fallback(locator, None, TileOutcome::DecodeFailed(e));
        }
    };

    let mut rng = StdRng::seed_from_u64(seed);
    match dominant_color(&image, clusters, &mut rng) {
        Ok(color) => {
            debug!(locator, %color, "dominant color");
            ImageTile::new(locator, Some(image), color, TileOutcome::Extracted)
        }
        Err(e) => {
            warn!(locator, error = %e, "color extraction failed, using fallback color");
            ImageTile::fallback(locator, Some(image), TileOutcome::ExtractionFailed(e))
        }
    }
}

/// Start every load at once and wait for all of them to settle.
///
/// Each tile gets its own RNG seeded from `config.seed` (or a random base) plus
/// its input index, so tiles share no state.
pub async fn settle_tiles<S: ImageSampler>(
    sampler: &S,
    locators: &[String],
    config: &MosaicConfig,
) -> Vec<ImageTile> {
    let base = config.seed.unwrap_or_else(rand::random);
    join_all(locators.iter().enumerate().map(|(i, locator)| {
        settle_tile(sampler, locator, &config.clusters, base.wrapping_add(i as u64))
    }))
    .await
}

/// Stable sort, brightest first. Tiles of equal brightness keep input order.
pub fn sort_by_brightness(tiles: &mut [ImageTile]) {
    tiles.sort_by(|a, b| b.brightness.total_cmp(&a.brightness));
}

/// Where a tile ended up on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub locator: String,
    pub color: String,
    pub brightness: f64,
    pub status: TileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub row: u32,
    pub col: u32,
    pub x: u32,
    pub y: u32,
    pub size: u32,
}

/// Lay tiles out left to right, top to bottom. Tiles past `rows * cols` are
/// dropped.
pub fn layout(tiles: &[ImageTile], config: &MosaicConfig) -> Vec<Placement> {
    let side = config.tile_side();
    let capacity = config.capacity();
    if tiles.len() > capacity {
        warn!(tiles = tiles.len(), capacity, "more images than grid cells, dropping the rest");
    }

    tiles
        .iter()
        .take(capacity)
        .enumerate()
        .map(|(i, tile)| {
            let row = i as u32 / config.cols;
            let col = i as u32 % config.cols;
            Placement {
                locator: tile.locator.clone(),
                color: tile.color.clone(),
                brightness: tile.brightness,
                status: tile.outcome.status(),
                error: tile.outcome.message(),
                row,
                col,
                x: col * side,
                y: row * side,
                size: side,
            }
        })
        .collect()
}

/// Paint placed tiles onto a transparent canvas. Tiles without pixels are
/// filled with their color.
pub fn render(tiles: &[ImageTile], placements: &[Placement], config: &MosaicConfig) -> RgbaImage {
    let side = config.tile_side();
    let mut canvas = RgbaImage::new(side * config.cols, side * config.rows);

    for (tile, place) in tiles.iter().zip(placements) {
        let (x, y) = (place.x as i64, place.y as i64);
        match &tile.image {
            Some(img) if img.width() > 0 && img.height() > 0 => {
                let scaled = imageops::resize(img, side, side, FilterType::Triangle);
                imageops::overlay(&mut canvas, &scaled, x, y);
            }
            _ => {
                let c = parse_hex(&tile.color)
                    .map(|c| Rgba([c.red, c.green, c.blue, 255]))
                    .unwrap_or(Rgba([0, 0, 0, 255]));
                imageops::replace(&mut canvas, &RgbaImage::from_pixel(side, side, c), x, y);
            }
        }
    }
    canvas
}

/// The exported canvas and how it was laid out.
#[derive(Debug)]
pub struct Composite {
    pub canvas: RgbaImage,
    pub placements: Vec<Placement>,
}

impl Composite {
    pub fn to_png(&self) -> Result<Vec<u8>> {
        encode_png(&self.canvas)
    }

    /// Colors in placement order.
    pub fn colors(&self) -> Vec<String> {
        self.placements.iter().map(|p| p.color.clone()).collect()
    }
}

pub fn encode_png(canvas: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    canvas
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(MosaicError::Encode)?;
    Ok(buf)
}

/// Run the whole export: load, color, sort, lay out and paint.
///
/// Only configuration problems fail the export; every per-image failure is
/// recovered with the fallback color.
pub async fn compose<S: ImageSampler>(
    sampler: &S,
    locators: &[String],
    config: &MosaicConfig,
) -> Result<Composite> {
    config.validate()?;

    let mut tiles = settle_tiles(sampler, locators, config).await;
    let failed = tiles.iter().filter(|t| t.is_fallback()).count();
    sort_by_brightness(&mut tiles);

    let placements = layout(&tiles, config);
    let canvas = render(&tiles, &placements, config);
    info!(
        images = locators.len(),
        failed,
        width = canvas.width(),
        height = canvas.height(),
        "composed canvas"
    );
    Ok(Composite { canvas, placements })
}
