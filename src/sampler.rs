use crate::{
    bucket::ColorBuckets,
    color::{self, Lab},
    filter::Filter,
    ALPHA_EMPTY_MAX, HISTOGRAM_BINS,
};
use image::{imageops::FilterType, RgbaImage};

/// Upper end of the chroma axis. sRGB reaches a CIELAB chroma of about 120 for saturated reds and greens; dividing by
/// 100 would push every vivid pixel into the top bin.
pub const CIELAB_CHROMA_MAX: f64 = 120.0;
pub const CIELAB_LIGHTNESS_MAX: f64 = 100.0;

#[cfg(feature = "parallel")]
const PARALLEL_CHUNK_SIZE: usize = 4096;

/// Everything collected in the single sampling pass over an image.
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    pub lightness_bins: [f64; HISTOGRAM_BINS],
    pub saturation_bins: [f64; HISTOGRAM_BINS],
    pub heatmap_bins: [f64; HISTOGRAM_BINS * HISTOGRAM_BINS],
    pub pixel_count: f64,
    pub buckets: ColorBuckets,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a single pixel into every histogram and the palette buckets.
    pub fn add(&mut self, rgb: (u8, u8, u8), lab: Lab, weight: f64) {
        let lightness_bin = bin_index(lab.l, CIELAB_LIGHTNESS_MAX);
        let saturation_bin = bin_index(lab.chroma(), CIELAB_CHROMA_MAX);

        self.lightness_bins[lightness_bin] += weight;
        self.saturation_bins[saturation_bin] += weight;
        self.heatmap_bins[saturation_bin * HISTOGRAM_BINS + lightness_bin] += weight;
        self.pixel_count += weight;
        self.buckets.add(rgb, weight);
    }

    #[cfg_attr(not(feature = "parallel"), allow(dead_code))]
    pub fn merge(&mut self, other: &Accumulator) {
        for (bin, value) in self.lightness_bins.iter_mut().zip(other.lightness_bins) {
            *bin += value;
        }

        for (bin, value) in self.saturation_bins.iter_mut().zip(other.saturation_bins) {
            *bin += value;
        }

        for (bin, value) in self.heatmap_bins.iter_mut().zip(other.heatmap_bins) {
            *bin += value;
        }

        self.pixel_count += other.pixel_count;
        self.buckets.merge(&other.buckets);
    }
}

/// Map a value in `0..=max` to one of the equally sized histogram bins. Out of range values are clamped.
pub fn bin_index(value: f64, max: f64) -> usize {
    let ratio = (value / max).clamp(0.0, 1.0);
    ((ratio * HISTOGRAM_BINS as f64).floor() as usize).min(HISTOGRAM_BINS - 1)
}

/// The fixed step between visited pixels so that no more than roughly `max_samples` pixels are visited.
pub fn sample_stride(total_pixels: usize, max_samples: usize) -> usize {
    if max_samples == 0 {
        return 1;
    }

    (total_pixels / max_samples).max(1)
}

/// The dimensions an image gets scaled to so its longer edge is at most `max_edge`.
pub fn scaled_dimensions(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    let longest = width.max(height);
    if max_edge == 0 || longest <= max_edge {
        return (width, height);
    }

    let ratio = max_edge as f64 / longest as f64;
    let scaled_width = ((width as f64 * ratio).round() as u32).max(1);
    let scaled_height = ((height as f64 * ratio).round() as u32).max(1);

    (scaled_width, scaled_height)
}

/// Scale the image down so its longer edge is at most `max_edge`. Images already small enough are returned as-is.
pub fn scale_image_down(image: RgbaImage, max_edge: u32, filter: FilterType) -> RgbaImage {
    let (width, height) = image.dimensions();
    let (scaled_width, scaled_height) = scaled_dimensions(width, height, max_edge);

    if (scaled_width, scaled_height) == (width, height) {
        image
    } else {
        image::imageops::resize(&image, scaled_width, scaled_height, filter)
    }
}

/// Run the sampling pass over an RGBA8 buffer, visiting every `stride`th pixel.
///
/// Pixels with an alpha of 16 or lower are treated as empty. Pixels any filter disallows are skipped entirely.
#[cfg_attr(feature = "parallel", allow(dead_code))]
pub fn sample(pixels: &[u8], stride: usize, filters: &[&dyn Filter]) -> Accumulator {
    let stride = stride.max(1);
    let total_pixels = pixels.len() / 4;
    let visited = (total_pixels + stride - 1) / stride;

    sample_range(pixels, stride, filters, 0, visited)
}

#[cfg(feature = "parallel")]
pub fn sample_parallel(pixels: &[u8], stride: usize, filters: &[&dyn Filter]) -> Accumulator {
    use rayon::prelude::*;

    let stride = stride.max(1);
    let total_pixels = pixels.len() / 4;
    let visited = (total_pixels + stride - 1) / stride;
    let chunks = (visited + PARALLEL_CHUNK_SIZE - 1) / PARALLEL_CHUNK_SIZE;

    // chunk boundaries only depend on the input, and partials are merged in order, so the float sums come out the
    // same no matter how the work gets scheduled
    let partials = (0..chunks)
        .into_par_iter()
        .map(|chunk| {
            let start = chunk * PARALLEL_CHUNK_SIZE;
            let end = (start + PARALLEL_CHUNK_SIZE).min(visited);
            sample_range(pixels, stride, filters, start, end)
        })
        .collect::<Vec<_>>();

    partials.iter().fold(Accumulator::new(), |mut acc, partial| {
        acc.merge(partial);
        acc
    })
}

// visits the pixels at ordinals start..end of the strided sequence
fn sample_range(pixels: &[u8], stride: usize, filters: &[&dyn Filter], start: usize, end: usize) -> Accumulator {
    let mut acc = Accumulator::new();

    for ordinal in start..end {
        let offset = ordinal * stride * 4;
        let alpha = pixels[offset + 3];

        if alpha <= ALPHA_EMPTY_MAX {
            continue;
        }

        let rgb = (pixels[offset], pixels[offset + 1], pixels[offset + 2]);
        let lab = color::rgb8_to_lab(rgb.0, rgb.1, rgb.2);

        if filters.iter().any(|filter| !filter.is_allowed(rgb, lab)) {
            continue;
        }

        acc.add(rgb, lab, alpha as f64 / 255.0);
    }

    acc
}
