use futures::FutureExt;
use js_sys::{Array, Object, Reflect, Uint8Array};
use rand::SeedableRng;
use rand::rngs::StdRng;
use wasm_bindgen::prelude::*;
#[cfg(not(target_arch = "wasm32"))]
use anyhow::{Context, Result as AnyResult};

pub mod cluster;
pub mod color;
pub mod compose;
pub mod config;
pub mod dominant;
pub mod error;
pub mod sampler;

pub use cluster::{Clustering, cluster};
pub use color::{FALLBACK_COLOR, HslPoint, brightness, perceptual_to_hex, rgb_to_perceptual};
pub use compose::{Composite, ImageTile, Placement, TileOutcome, TileStatus, compose};
pub use config::{ClusterConfig, DEFAULT_EXPORT_FILENAME, MosaicConfig};
pub use dominant::{dominant_color, extract_palette, select_dominant};
pub use error::{ColorError, ExtractionError, MosaicError, SampleError};
pub use sampler::{FsSampler, ImageSampler, MemorySampler};

fn seeded_rng(seed: Option<u64>) -> StdRng {
    StdRng::seed_from_u64(seed.unwrap_or_else(rand::random))
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Compose album covers into one PNG canvas ordered by dominant-color brightness.
///
/// `images` holds one entry per album: a `Uint8Array` with the encoded image the
/// page already fetched, or `null`/`undefined` when the fetch failed. Failed
/// entries still get a cell, painted black and sorted last.
///
/// Returns `{ image: Uint8Array, filename: string, colors: string[] }` where
/// `colors` lists each placed tile's color in grid order.
#[wasm_bindgen]
pub fn compose_canvas(
    images: Array,
    rows: u32,
    cols: u32,
    n_colors: Option<u32>,
    seed: Option<u32>,
) -> Result<Object, JsValue> {
    let entries = images.iter().map(|entry| {
        entry
            .is_instance_of::<Uint8Array>()
            .then(|| Uint8Array::new(&entry).to_vec())
    });

    let mut config = MosaicConfig::new(rows, cols);
    if let Some(k) = n_colors {
        config.clusters.k = k as usize;
    }
    config.seed = seed.map(u64::from);

    let composite = compose_entries(entries, &config).map_err(js_err)?;
    let png = composite.to_png().map_err(js_err)?;

    let colors_js = Array::new();
    for color in composite.colors() {
        colors_js.push(&JsValue::from_str(&color));
    }

    let result = Object::new();
    Reflect::set(&result, &JsValue::from_str("image"), &Uint8Array::from(png.as_slice()))?;
    Reflect::set(&result, &JsValue::from_str("filename"), &JsValue::from_str(DEFAULT_EXPORT_FILENAME))?;
    Reflect::set(&result, &JsValue::from_str("colors"), &colors_js)?;
    Ok(result)
}

/// Compose from per-album encoded bytes already in memory; `None` marks an
/// album that failed to fetch.
///
/// The in-memory sampler never suspends, so the join is polled once.
pub fn compose_entries<I>(entries: I, config: &MosaicConfig) -> Result<Composite, MosaicError>
where
    I: IntoIterator<Item = Option<Vec<u8>>>,
{
    let (sampler, locators) = MemorySampler::from_entries(entries);
    compose(&sampler, &locators, config)
        .now_or_never()
        .ok_or(MosaicError::Pending)?
}

/// Dominant color of every cluster of one encoded image, `null` for empty clusters.
#[wasm_bindgen]
pub fn dominant_colors(input: Vec<u8>, n_colors: usize, seed: Option<u32>) -> Result<Array, JsValue> {
    let img = image::load_from_memory(&input)
        .map_err(|e| JsValue::from_str(&format!("Unable to decode image: {e}")))?
        .to_rgba8();

    let mut rng = seeded_rng(seed.map(u64::from));
    let palette = extract_palette(&img, &ClusterConfig::with_k(n_colors), &mut rng).map_err(js_err)?;

    let out = Array::new();
    for color in palette {
        match color {
            Some(hex) => out.push(&JsValue::from_str(&hex)),
            None => out.push(&JsValue::NULL),
        };
    }
    Ok(out)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn compose_canvas_files(
    paths: &[std::path::PathBuf],
    config: &MosaicConfig,
) -> AnyResult<Composite> {
    let locators: Vec<String> = paths.iter().map(|p| p.to_string_lossy().into_owned()).collect();
    futures::executor::block_on(compose(&FsSampler::new(), &locators, config))
        .context("canvas composition failed")
}

#[cfg(not(target_arch = "wasm32"))]
pub fn extract_palette_bytes(
    input: &[u8],
    clusters: &ClusterConfig,
    seed: Option<u64>,
) -> AnyResult<Vec<Option<String>>> {
    let img = image::load_from_memory(input)?.to_rgba8();
    let mut rng = seeded_rng(seed);
    Ok(extract_palette(&img, clusters, &mut rng)?)
}
