//! Error types for the album grid pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, MosaicError>;

/// An image locator could not be turned into pixels.
#[derive(Error, Debug)]
pub enum SampleError {
    /// The locator pointed at a file that could not be read.
    #[error("failed to read image `{locator}`")]
    Io {
        locator: String,
        #[source]
        source: std::io::Error,
    },

    /// The bytes were read but are not a decodable image.
    #[error("failed to decode image `{locator}`")]
    Decode {
        locator: String,
        #[source]
        source: image::ImageError,
    },

    /// The sampler has no data for this locator.
    #[error("no image source registered for `{locator}`")]
    Missing { locator: String },
}

impl SampleError {
    /// The locator that failed to load.
    pub fn locator(&self) -> &str {
        match self {
            SampleError::Io { locator, .. }
            | SampleError::Decode { locator, .. }
            | SampleError::Missing { locator } => locator,
        }
    }
}

/// A decoded image did not yield a dominant color.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("cluster count must be at least 1")]
    InvalidClusterCount,

    #[error("first cluster is empty, no dominant color")]
    NoDominantColor,
}

/// A string was not a `#rrggbb` color.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid hex color `{value}`")]
pub struct ColorError {
    pub value: String,
}

/// Errors that abort a whole export.
///
/// Per-tile failures never show up here; they are recovered with the fallback
/// color and recorded on the tile instead.
#[derive(Error, Debug)]
pub enum MosaicError {
    #[error("invalid grid {rows}x{cols}: rows and columns must be non-zero")]
    InvalidGrid { rows: u32, cols: u32 },

    #[error("canvas extent {extent} is too small for a {rows}x{cols} grid")]
    CanvasTooSmall { extent: u32, rows: u32, cols: u32 },

    #[error("invalid parameter: {parameter} = {value}")]
    InvalidParameter { parameter: String, value: String },

    #[error("failed to read config {path}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("image sampling did not complete")]
    Pending,

    #[error("PNG encode error")]
    Encode(#[source] image::ImageError),

    #[error(transparent)]
    Sample(#[from] SampleError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Color(#[from] ColorError),
}
