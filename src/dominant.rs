//! Weighted vote that picks one representative color per cluster.

use std::collections::HashMap;

use image::RgbaImage;
use rand::Rng;

use crate::cluster::cluster;
use crate::color::{HslPoint, perceptual_to_hex, rgb_to_perceptual};
use crate::config::ClusterConfig;
use crate::error::ExtractionError;

/// Pick the hex color with the largest pooled vote weight.
///
/// Points that format to the same hex string pool their weight. Ties go to
/// the hex seen first, so a non-empty cluster always yields a color even
/// when every point is achromatic and weighs zero.
pub fn select_dominant(cluster: &[HslPoint]) -> Option<String> {
    // hex -> (first position, pooled weight)
    let mut votes: HashMap<String, (usize, f64)> = HashMap::new();
    for (pos, point) in cluster.iter().enumerate() {
        votes.entry(perceptual_to_hex(point)).or_insert((pos, 0.0)).1 += point.vote_weight();
    }

    votes
        .into_iter()
        .max_by(|(_, (pos_a, w_a)), (_, (pos_b, w_b))| {
            w_a.total_cmp(w_b).then(pos_b.cmp(pos_a))
        })
        .map(|(hex, _)| hex)
}

/// Convert every pixel of `image` to HSL. Alpha is ignored.
pub fn image_points(image: &RgbaImage) -> Vec<HslPoint> {
    image
        .pixels()
        .map(|p| rgb_to_perceptual(p[0], p[1], p[2]))
        .collect()
}

/// Dominant color of every cluster of `image`, in cluster order.
pub fn extract_palette<R: Rng + ?Sized>(
    image: &RgbaImage,
    config: &ClusterConfig,
    rng: &mut R,
) -> Result<Vec<Option<String>>, ExtractionError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(ExtractionError::EmptyImage { width, height });
    }

    let points = image_points(image);
    let clustering = cluster(&points, config, rng)?;
    Ok(clustering.groups.iter().map(|g| select_dominant(g)).collect())
}

/// Dominant color of the first cluster, which is what the tile ordering uses.
pub fn dominant_color<R: Rng + ?Sized>(
    image: &RgbaImage,
    config: &ClusterConfig,
    rng: &mut R,
) -> Result<String, ExtractionError> {
    extract_palette(image, config, rng)?
        .into_iter()
        .next()
        .flatten()
        .ok_or(ExtractionError::NoDominantColor)
}
