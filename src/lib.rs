// Copyright 2022 Spanfile
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A library to extract a color fingerprint from an image.
//!
//! An analysis produces a palette of up to eight dominant colors, clustered in CIELAB, and a 3×3 histogram of CIELAB
//! chroma against lightness that can be rendered as a heatmap. Pixels matching the dominant border color can
//! optionally be excluded as background.
//!
//! ```no_run
//! let image = chromagene::image::open("photo.jpg")?.to_rgba8();
//! let analysis = chromagene::AnalysisBuilder::from_image(image)
//!     .remove_background(true)
//!     .analyze()?;
//!
//! for swatch in analysis.palette() {
//!     println!("{} {:.3}", swatch.hex(), swatch.ratio());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod background;
pub mod batch;
mod bucket;
mod cluster;
pub mod color;
mod error;
mod filter;
mod heatmap;
mod sampler;
mod swatch;

/// Number of bins on each histogram axis.
pub const HISTOGRAM_BINS: usize = 3;
pub const DEFAULT_MAX_EDGE: u32 = 512;
pub const DEFAULT_MAX_SAMPLES: usize = 70_000;
/// Pixels with an alpha at or below this are treated as empty.
pub const ALPHA_EMPTY_MAX: u8 = 16;

pub use crate::{
    background::{estimate_background, BackgroundModel},
    cluster::{PALETTE_MIN_LAB_DISTANCE, PALETTE_SIZE},
    error::{AnalysisError, Result},
    filter::Filter,
    heatmap::{compute_heatmap_cells, HeatmapCell, HeatmapCells},
    sampler::CIELAB_CHROMA_MAX,
    swatch::Swatch,
};
pub use image;

use image::{imageops::FilterType, RgbaImage};
use log::debug;

/// The result of analyzing a single image.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Analysis {
    heatmap_bins: [f64; HISTOGRAM_BINS * HISTOGRAM_BINS],
    lightness_bins: [f64; HISTOGRAM_BINS],
    saturation_bins: [f64; HISTOGRAM_BINS],
    pixel_count: f64,
    palette: Vec<Swatch>,
    background: Option<BackgroundModel>,
}

pub struct AnalysisBuilder {
    image: RgbaImage,
    remove_background: bool,
    max_edge: u32,
    max_samples: usize,
    resize_filter: FilterType,
    filters: Vec<Box<dyn Filter>>,
}

/// Analyze an RGBA8 buffer of the given dimensions with the default settings.
pub fn analyze(pixels: &[u8], width: u32, height: u32, remove_background: bool) -> Result<Analysis> {
    AnalysisBuilder::from_rgba(pixels, width, height)?
        .remove_background(remove_background)
        .analyze()
}

impl Analysis {
    /// The joint histogram, indexed `chroma_bin * 3 + lightness_bin`, each bin holding the alpha-weighted pixel count.
    pub fn heatmap_bins(&self) -> &[f64; HISTOGRAM_BINS * HISTOGRAM_BINS] {
        &self.heatmap_bins
    }

    pub fn lightness_bins(&self) -> &[f64; HISTOGRAM_BINS] {
        &self.lightness_bins
    }

    /// The chroma histogram, over 0 to [`CIELAB_CHROMA_MAX`].
    pub fn saturation_bins(&self) -> &[f64; HISTOGRAM_BINS] {
        &self.saturation_bins
    }

    /// The alpha-weighted number of sampled pixels that were neither transparent nor background.
    pub fn pixel_count(&self) -> f64 {
        self.pixel_count
    }

    pub fn palette(&self) -> &[Swatch] {
        &self.palette
    }

    /// The background model used to exclude pixels, if background removal was requested and the border was uniform
    /// enough.
    pub fn background(&self) -> Option<BackgroundModel> {
        self.background
    }

    pub fn heatmap_cells(&self) -> Option<HeatmapCells> {
        compute_heatmap_cells(&self.heatmap_bins, self.pixel_count)
    }
}

impl AnalysisBuilder {
    pub fn from_image(image: RgbaImage) -> Self {
        Self {
            image,
            remove_background: false,
            max_edge: DEFAULT_MAX_EDGE,
            max_samples: DEFAULT_MAX_SAMPLES,
            resize_filter: FilterType::Triangle,
            filters: Vec::new(),
        }
    }

    /// Start from a raw RGBA8 buffer. The buffer must hold exactly `width * height` pixels.
    pub fn from_rgba(pixels: &[u8], width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(AnalysisError::ZeroDimensions { width, height });
        }

        let mismatch = || AnalysisError::BufferSizeMismatch {
            width,
            height,
            len: pixels.len(),
        };

        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|area| area.checked_mul(4))
            .ok_or_else(mismatch)?;

        if pixels.len() != expected {
            return Err(mismatch());
        }

        let image = RgbaImage::from_raw(width, height, pixels.to_vec()).ok_or_else(mismatch)?;
        Ok(Self::from_image(image))
    }

    pub fn remove_background(self, remove_background: bool) -> Self {
        Self {
            remove_background,
            ..self
        }
    }

    /// The longest edge the image is scaled down to before sampling. 0 disables scaling.
    pub fn max_edge(self, max_edge: u32) -> Self {
        Self { max_edge, ..self }
    }

    /// The approximate upper bound of pixels visited in the sampling pass. 0 visits every pixel.
    pub fn max_samples(self, max_samples: usize) -> Self {
        Self { max_samples, ..self }
    }

    pub fn resize_filter(self, resize_filter: FilterType) -> Self {
        Self { resize_filter, ..self }
    }

    pub fn add_filter<F>(mut self, filter: F) -> Self
    where
        F: Filter + 'static,
    {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn clear_filters(self) -> Self {
        Self {
            filters: Vec::new(),
            ..self
        }
    }

    pub fn analyze(self) -> Result<Analysis> {
        let (width, height) = self.image.dimensions();
        if width == 0 || height == 0 {
            return Err(AnalysisError::ZeroDimensions { width, height });
        }

        let image = sampler::scale_image_down(self.image, self.max_edge, self.resize_filter);
        let (width, height) = image.dimensions();
        let pixels = image.as_raw();

        let background = if self.remove_background {
            estimate_background(pixels, width, height)
        } else {
            None
        };

        let mut filters = self.filters.iter().map(|filter| filter.as_ref()).collect::<Vec<&dyn Filter>>();
        if let Some(background) = &background {
            filters.push(background);
        }

        let stride = sampler::sample_stride(width as usize * height as usize, self.max_samples);

        #[cfg(feature = "parallel")]
        let acc = sampler::sample_parallel(pixels, stride, &filters);
        #[cfg(not(feature = "parallel"))]
        let acc = sampler::sample(pixels, stride, &filters);

        debug!(
            "Sampled {}x{} image with stride {}: {:.1} pixels in {} color buckets",
            width,
            height,
            stride,
            acc.pixel_count,
            acc.buckets.len()
        );

        if acc.pixel_count <= 0.0 {
            return Err(AnalysisError::EmptyAnalysis);
        }

        let palette = cluster::extract_palette(&acc.buckets, acc.pixel_count);

        Ok(Analysis {
            heatmap_bins: acc.heatmap_bins,
            lightness_bins: acc.lightness_bins,
            saturation_bins: acc.saturation_bins,
            pixel_count: acc.pixel_count,
            palette,
            background,
        })
    }
}
