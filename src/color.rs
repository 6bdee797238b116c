//! RGB <-> HSL conversion, hex formatting and brightness scoring.

use std::str::FromStr;

use palette::Srgb;

use crate::error::ColorError;

/// Color used for tiles whose dominant color could not be computed.
pub const FALLBACK_COLOR: &str = "#000000";

/// A pixel in HSL space with every component normalized to `[0, 1]`.
///
/// Hue lies in `[0, 1)`, wrapping around at 1.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HslPoint {
    pub hue: f64,
    pub saturation: f64,
    pub lightness: f64,
}

impl HslPoint {
    pub const fn new(hue: f64, saturation: f64, lightness: f64) -> Self {
        Self { hue, saturation, lightness }
    }

    /// Euclidean distance in (h, s, l) space. Hue is not treated as circular.
    #[inline]
    pub fn distance(&self, other: &HslPoint) -> f64 {
        self.distance_squared(other).sqrt()
    }

    #[inline]
    pub fn distance_squared(&self, other: &HslPoint) -> f64 {
        let dh = self.hue - other.hue;
        let ds = self.saturation - other.saturation;
        let dl = self.lightness - other.lightness;
        dh * dh + ds * ds + dl * dl
    }

    /// Vote weight: favours saturated mid-lightness colors over near-black,
    /// near-white and grey pixels.
    #[inline]
    pub fn vote_weight(&self) -> f64 {
        self.saturation * (1.0 - (0.5 - self.lightness).abs())
    }
}

/// Convert 8-bit RGB to HSL.
pub fn rgb_to_perceptual(r: u8, g: u8, b: u8) -> HslPoint {
    let r = r as f64 / 255.0;
    let g = g as f64 / 255.0;
    let b = b as f64 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let lightness = (max + min) / 2.0;

    if max == min {
        // achromatic
        return HslPoint::new(0.0, 0.0, lightness);
    }

    let d = max - min;
    let saturation = if lightness > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };

    let hue = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    HslPoint::new(hue / 6.0, saturation, lightness)
}

fn hue_to_channel(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 1.0 / 2.0 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}

#[inline]
fn channel_to_u8(x: f64) -> u8 {
    (x * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Convert an HSL point back to 8-bit RGB channels.
pub fn perceptual_to_rgb(point: &HslPoint) -> [u8; 3] {
    let HslPoint { hue: h, saturation: s, lightness: l } = *point;

    if s == 0.0 {
        let v = channel_to_u8(l);
        return [v, v, v];
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    [
        channel_to_u8(hue_to_channel(p, q, h + 1.0 / 3.0)),
        channel_to_u8(hue_to_channel(p, q, h)),
        channel_to_u8(hue_to_channel(p, q, h - 1.0 / 3.0)),
    ]
}

/// Format an HSL point as a lowercase `#rrggbb` string.
pub fn perceptual_to_hex(point: &HslPoint) -> String {
    let [r, g, b] = perceptual_to_rgb(point);
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Parse a `#rrggbb` string.
pub fn parse_hex(hex: &str) -> Result<Srgb<u8>, ColorError> {
    let invalid = || ColorError { value: hex.to_string() };
    if hex.len() != 7 || !hex.starts_with('#') {
        return Err(invalid());
    }
    Srgb::<u8>::from_str(hex).map_err(|_| invalid())
}

/// Perceptual brightness of a hex color: `0.299 R + 0.587 G + 0.114 B`.
pub fn brightness(hex: &str) -> Result<f64, ColorError> {
    let c = parse_hex(hex)?;
    Ok(luma(c.red, c.green, c.blue))
}

#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> f64 {
    (r as f64 * 299.0 + g as f64 * 587.0 + b as f64 * 114.0) / 1000.0
}
