//! Turning image locators into RGBA pixel buffers.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;

use image::RgbaImage;

use crate::error::SampleError;

/// Decodes an image locator into row-major RGBA pixels.
///
/// A failure to load is reported as [`SampleError`]; a successfully decoded
/// image with no pixels is returned as-is and rejected later by extraction.
pub trait ImageSampler {
    fn sample(&self, locator: &str) -> impl Future<Output = Result<RgbaImage, SampleError>>;
}

fn decode(locator: &str, bytes: &[u8]) -> Result<RgbaImage, SampleError> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(|source| SampleError::Decode { locator: locator.to_string(), source })
}

/// Reads locators as filesystem paths, optionally relative to a base directory.
#[derive(Debug, Clone, Default)]
pub struct FsSampler {
    base: Option<PathBuf>,
}

impl FsSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self { base: Some(base.into()) }
    }

    fn resolve(&self, locator: &str) -> PathBuf {
        match &self.base {
            Some(base) => base.join(locator),
            None => PathBuf::from(locator),
        }
    }
}

impl ImageSampler for FsSampler {
    async fn sample(&self, locator: &str) -> Result<RgbaImage, SampleError> {
        let bytes = std::fs::read(self.resolve(locator))
            .map_err(|source| SampleError::Io { locator: locator.to_string(), source })?;
        decode(locator, &bytes)
    }
}

/// Serves encoded images that the host has already fetched.
///
/// Locators without registered bytes fail the same way a broken URL would.
#[derive(Debug, Clone, Default)]
pub struct MemorySampler {
    sources: HashMap<String, Vec<u8>>,
}

impl MemorySampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, locator: impl Into<String>, bytes: Vec<u8>) {
        self.sources.insert(locator.into(), bytes);
    }

    pub fn with(mut self, locator: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(locator, bytes);
        self
    }

    /// Build a sampler from per-album bytes in input order.
    ///
    /// Every entry gets a locator `album-<index>`; `None` entries (fetches
    /// the host gave up on) are left unregistered so they fail to load.
    pub fn from_entries<I>(entries: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = Option<Vec<u8>>>,
    {
        let mut sampler = Self::new();
        let mut locators = Vec::new();
        for (i, entry) in entries.into_iter().enumerate() {
            let locator = format!("album-{i}");
            if let Some(bytes) = entry {
                sampler.insert(locator.clone(), bytes);
            }
            locators.push(locator);
        }
        (sampler, locators)
    }
}

impl ImageSampler for MemorySampler {
    async fn sample(&self, locator: &str) -> Result<RgbaImage, SampleError> {
        let bytes = self
            .sources
            .get(locator)
            .ok_or_else(|| SampleError::Missing { locator: locator.to_string() })?;
        decode(locator, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use image::{ImageFormat, Rgba};

    fn png(img: &RgbaImage) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut buf), ImageFormat::Png).unwrap();
        buf
    }

    #[test]
    fn memory_sampler_decodes_png() {
        let img = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]));
        let sampler = MemorySampler::new().with("cover", png(&img));
        let out = block_on(sampler.sample("cover")).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn missing_locator_is_a_decode_failure() {
        let sampler = MemorySampler::new();
        let err = block_on(sampler.sample("nope")).unwrap_err();
        assert!(matches!(err, SampleError::Missing { .. }));
        assert_eq!(err.locator(), "nope");
    }

    #[test]
    fn entries_keep_order_and_skip_missing() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([9, 9, 9, 255]));
        let (sampler, locators) = MemorySampler::from_entries([None, Some(png(&img)), None]);
        assert_eq!(locators, ["album-0", "album-1", "album-2"]);
        assert!(matches!(
            block_on(sampler.sample("album-0")),
            Err(SampleError::Missing { .. })
        ));
        assert_eq!(block_on(sampler.sample("album-1")).unwrap(), img);
        assert!(block_on(sampler.sample("album-2")).is_err());
    }

    #[test]
    fn corrupt_bytes_fail_to_decode() {
        let sampler = MemorySampler::new().with("bad", b"definitely not a png".to_vec());
        let err = block_on(sampler.sample("bad")).unwrap_err();
        assert!(matches!(err, SampleError::Decode { .. }));
    }

    #[test]
    fn fs_sampler_reports_missing_file() {
        let sampler = FsSampler::with_base(std::env::temp_dir());
        let err = block_on(sampler.sample("album-grid-no-such-file.png")).unwrap_err();
        assert!(matches!(err, SampleError::Io { .. }));
    }

    #[test]
    fn fs_sampler_reads_file() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([200, 10, 10, 255]));
        let path = std::env::temp_dir().join(format!("album-grid-{}.png", std::process::id()));
        std::fs::write(&path, png(&img)).unwrap();
        let out = block_on(FsSampler::new().sample(path.to_str().unwrap()));
        std::fs::remove_file(&path).unwrap();
        assert_eq!(out.unwrap(), img);
    }
}
