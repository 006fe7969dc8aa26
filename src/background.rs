use crate::{
    bucket::ColorBuckets,
    color::{self, Lab},
    filter::Filter,
    ALPHA_EMPTY_MAX,
};
use log::debug;

/// Minimum alpha-weighted number of border pixels needed to trust the border at all.
pub const BACKGROUND_MIN_BORDER_SAMPLES: f64 = 24.0;
/// Fraction of the border weight the most common border color must hold to be treated as background.
pub const BACKGROUND_DOMINANCE_THRESHOLD: f64 = 0.6;
/// Exclusion radius for near-gray backgrounds, which tend to carry more noise and anti-aliasing.
pub const BACKGROUND_DISTANCE_LOW_CHROMA: f64 = 18.0;
/// Exclusion radius for colored backgrounds.
pub const BACKGROUND_DISTANCE_HIGH_CHROMA: f64 = 12.0;
/// Chroma under which a background counts as near-gray.
pub const BACKGROUND_LOW_CHROMA_LIMIT: f64 = 16.0;

/// A presumed background color and the squared CIELAB distance within which pixels are excluded as background.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BackgroundModel {
    lab: Lab,
    threshold2: f64,
}

impl BackgroundModel {
    pub fn new(lab: Lab, threshold2: f64) -> Self {
        Self { lab, threshold2 }
    }

    pub fn lab(&self) -> Lab {
        self.lab
    }

    /// The squared CIELAB distance cutoff.
    pub fn threshold2(&self) -> f64 {
        self.threshold2
    }

    pub fn is_background(&self, lab: Lab) -> bool {
        lab.distance_squared(self.lab) <= self.threshold2
    }
}

impl Filter for BackgroundModel {
    fn is_allowed(&self, _: (u8, u8, u8), lab: Lab) -> bool {
        !self.is_background(lab)
    }
}

/// Estimate the background color of an RGBA8 buffer from its outermost ring of pixels.
///
/// Returns `None` when the border holds too few opaque pixels or when no single color dominates it.
pub fn estimate_background(pixels: &[u8], width: u32, height: u32) -> Option<BackgroundModel> {
    let (width, height) = (width as usize, height as usize);
    if width == 0 || height == 0 || pixels.len() < width * height * 4 {
        return None;
    }

    let mut border = ColorBuckets::new();
    let mut collect = |x: usize, y: usize| {
        let offset = (y * width + x) * 4;
        let alpha = pixels[offset + 3];

        if alpha > ALPHA_EMPTY_MAX {
            let rgb = (pixels[offset], pixels[offset + 1], pixels[offset + 2]);
            border.add(rgb, alpha as f64 / 255.0);
        }
    };

    for x in 0..width {
        collect(x, 0);

        if height > 1 {
            collect(x, height - 1);
        }
    }

    for y in 1..height.saturating_sub(1) {
        collect(0, y);

        if width > 1 {
            collect(width - 1, y);
        }
    }

    let border_weight = border.total_weight();
    if border_weight < BACKGROUND_MIN_BORDER_SAMPLES {
        debug!("Not enough border samples to estimate a background ({:.2})", border_weight);
        return None;
    }

    let dominant = border.dominant()?;
    let dominance = dominant.weight / border_weight;
    if dominance < BACKGROUND_DOMINANCE_THRESHOLD {
        debug!("Border is not uniform enough to be a background (dominance {:.3})", dominance);
        return None;
    }

    let (r, g, b) = dominant.average_rgb();
    let lab = color::rgb_to_lab(r, g, b);
    let distance = if lab.chroma() < BACKGROUND_LOW_CHROMA_LIMIT {
        BACKGROUND_DISTANCE_LOW_CHROMA
    } else {
        BACKGROUND_DISTANCE_HIGH_CHROMA
    };

    debug!(
        "Estimated background L={:.1} a={:.1} b={:.1} (dominance {:.3}, radius {})",
        lab.l, lab.a, lab.b, dominance, distance
    );

    Some(BackgroundModel::new(lab, distance * distance))
}
