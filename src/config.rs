//! Tunable parameters for clustering and canvas composition.
//!
//! Defaults reproduce the stock export: five clusters per image and a canvas
//! whose longer side is 4000 pixels. A config can also be loaded from JSON:
//!
//! ```no_run
//! use album_grid_wasm::MosaicConfig;
//! use std::path::Path;
//!
//! let config = MosaicConfig::from_json_file(Path::new("grid.json"))?;
//! # Ok::<(), album_grid_wasm::MosaicError>(())
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MosaicError, Result};

/// Default number of clusters per image.
pub const DEFAULT_CLUSTERS: usize = 5;
/// Default iteration cap for k-means.
pub const DEFAULT_MAX_ITERATIONS: usize = 100;
/// Centroid movement at or below which k-means is considered converged.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;
/// Length in pixels of the longer canvas side.
pub const DEFAULT_CANVAS_EXTENT: u32 = 4000;
/// File name used for the exported canvas.
pub const DEFAULT_EXPORT_FILENAME: &str = "canvas.png";

/// k-means parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Number of clusters (`k`).
    pub k: usize,
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            k: DEFAULT_CLUSTERS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl ClusterConfig {
    pub fn with_k(k: usize) -> Self {
        Self { k, ..Self::default() }
    }
}

/// Full export configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MosaicConfig {
    pub rows: u32,
    pub cols: u32,
    /// Pixel length of the longer canvas side; each tile is
    /// `canvas_extent / max(rows, cols)` pixels square.
    pub canvas_extent: u32,
    pub clusters: ClusterConfig,
    /// Seed for centroid sampling. `None` draws from the OS.
    pub seed: Option<u64>,
}

impl Default for MosaicConfig {
    fn default() -> Self {
        Self {
            rows: 3,
            cols: 3,
            canvas_extent: DEFAULT_CANVAS_EXTENT,
            clusters: ClusterConfig::default(),
            seed: None,
        }
    }
}

impl MosaicConfig {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols, ..Self::default() }
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| MosaicError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| MosaicError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Side length of one square tile in pixels.
    pub fn tile_side(&self) -> u32 {
        self.canvas_extent / self.rows.max(self.cols).max(1)
    }

    pub fn capacity(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// Reject configurations that cannot produce a canvas.
    ///
    /// A cluster count of zero is not rejected here: it surfaces per tile as an
    /// extraction failure so the export still completes.
    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(MosaicError::InvalidGrid { rows: self.rows, cols: self.cols });
        }
        if self.tile_side() == 0 {
            return Err(MosaicError::CanvasTooSmall {
                extent: self.canvas_extent,
                rows: self.rows,
                cols: self.cols,
            });
        }
        let tol = self.clusters.tolerance;
        if !tol.is_finite() || tol < 0.0 {
            return Err(MosaicError::InvalidParameter {
                parameter: "clusters.tolerance".to_string(),
                value: tol.to_string(),
            });
        }
        Ok(())
    }
}

/// Near-square grid for `n` images: columns first, then enough rows.
pub fn grid_for(n: usize) -> (u32, u32) {
    if n == 0 {
        return (1, 1);
    }
    let cols = (n as f64).sqrt().ceil() as u32;
    let rows = (n as u32).div_ceil(cols);
    (rows, cols)
}
