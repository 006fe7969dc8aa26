//! sRGB to CIELAB (D65) conversion and the distance helpers built on it.

use palette::{FromColor, Hsv, Srgb};

const SRGB_LINEAR_THRESHOLD: f64 = 0.04045;
const SRGB_LINEAR_SLOPE: f64 = 12.92;
const SRGB_GAMMA: f64 = 2.4;

const LAB_EPSILON: f64 = 216.0 / 24389.0;
const LAB_KAPPA: f64 = 24389.0 / 27.0;

// D65 reference white
const WHITE_X: f64 = 0.95047;
const WHITE_Y: f64 = 1.0;
const WHITE_Z: f64 = 1.08883;

/// A color in CIELAB space, relative to the D65 white point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Lab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

impl Lab {
    pub fn new(l: f64, a: f64, b: f64) -> Self {
        Self { l, a, b }
    }

    /// The colorfulness of the color, `sqrt(a² + b²)`.
    pub fn chroma(self) -> f64 {
        (self.a * self.a + self.b * self.b).sqrt()
    }

    pub fn distance_squared(self, other: Lab) -> f64 {
        let dl = self.l - other.l;
        let da = self.a - other.a;
        let db = self.b - other.b;

        dl * dl + da * da + db * db
    }
}

/// Remove the sRGB transfer curve from a single channel in 0..1.
pub fn srgb_to_linear(value: f64) -> f64 {
    if value <= SRGB_LINEAR_THRESHOLD {
        value / SRGB_LINEAR_SLOPE
    } else {
        ((value + 0.055) / 1.055).powf(SRGB_GAMMA)
    }
}

fn lab_f(value: f64) -> f64 {
    if value > LAB_EPSILON {
        value.cbrt()
    } else {
        (LAB_KAPPA * value + 16.0) / 116.0
    }
}

/// Convert an sRGB color with channels in 0..1 into CIELAB. Lightness is clamped to 0..100.
pub fn rgb_to_lab(r: f64, g: f64, b: f64) -> Lab {
    let rl = srgb_to_linear(r);
    let gl = srgb_to_linear(g);
    let bl = srgb_to_linear(b);

    let x = 0.4124564 * rl + 0.3575761 * gl + 0.1804375 * bl;
    let y = 0.2126729 * rl + 0.7151522 * gl + 0.0721750 * bl;
    let z = 0.0193339 * rl + 0.1191920 * gl + 0.9503041 * bl;

    let fx = lab_f(x / WHITE_X);
    let fy = lab_f(y / WHITE_Y);
    let fz = lab_f(z / WHITE_Z);

    Lab {
        l: (116.0 * fy - 16.0).clamp(0.0, 100.0),
        a: 500.0 * (fx - fy),
        b: 200.0 * (fy - fz),
    }
}

/// Convert 8-bit sRGB channels into CIELAB.
pub fn rgb8_to_lab(r: u8, g: u8, b: u8) -> Lab {
    rgb_to_lab(r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0)
}

/// HSV-style saturation of an sRGB color with channels in 0..1, scaled to 0..100.
pub fn hsv_saturation(r: f64, g: f64, b: f64) -> f64 {
    let hsv: Hsv<palette::encoding::Srgb, f64> = Hsv::from_color(Srgb::new(r, g, b));
    hsv.saturation * 100.0
}
