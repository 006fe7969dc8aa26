use crate::HISTOGRAM_BINS;
use std::fmt;

pub const HEATMAP_LEVELS: u32 = 8;
pub const HEATMAP_UPPER_QUANTILE: f64 = 0.96;
pub const HEATMAP_GAMMA: f64 = 0.72;

const LOW_COLOR: (f64, f64, f64) = (56.0, 96.0, 160.0);
const HIGH_COLOR: (f64, f64, f64) = (255.0, 156.0, 72.0);
const LOW_ALPHA: f64 = 56.0;
const HIGH_ALPHA: f64 = 255.0;

/// Heatmap cells, indexed `[row][column]`. Row 0 holds the highest chroma bin, columns go from low to high lightness.
pub type HeatmapCells = [[HeatmapCell; HISTOGRAM_BINS]; HISTOGRAM_BINS];

/// The display color of a single heatmap cell.
///
/// Formats as a CSS color: `transparent` for empty cells, `rgba(r,g,b,a)` otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HeatmapCell {
    Empty,
    Filled {
        red: u8,
        green: u8,
        blue: u8,
        /// 0..1
        alpha: f64,
        /// The quantized intensity level, 1 to `HEATMAP_LEVELS - 1`
        level: u32,
    },
}

impl HeatmapCell {
    fn from_intensity(level: u32) -> Self {
        let intensity = level as f64 / (HEATMAP_LEVELS - 1) as f64;
        let lerp = |low: f64, high: f64| (low + (high - low) * intensity).round() as u8;

        Self::Filled {
            red: lerp(LOW_COLOR.0, HIGH_COLOR.0),
            green: lerp(LOW_COLOR.1, HIGH_COLOR.1),
            blue: lerp(LOW_COLOR.2, HIGH_COLOR.2),
            alpha: (LOW_ALPHA + (HIGH_ALPHA - LOW_ALPHA) * intensity) / 255.0,
            level,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, HeatmapCell::Empty)
    }
}

impl fmt::Display for HeatmapCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeatmapCell::Empty => write!(f, "transparent"),
            HeatmapCell::Filled {
                red,
                green,
                blue,
                alpha,
                ..
            } => write!(f, "rgba({},{},{},{:.2})", red, green, blue, alpha),
        }
    }
}

/// Turn the joint chroma/lightness histogram into display cells.
///
/// Bins are normalized by the pixel count and capped at the 96th percentile of the non-empty bins (but never below
/// an eighth of the largest bin), gamma-compressed and quantized into `HEATMAP_LEVELS` steps.
///
/// Returns `None` if the histogram has the wrong size, the pixel count isn't positive, or every bin is empty.
pub fn compute_heatmap_cells(bins: &[f64], pixel_count: f64) -> Option<HeatmapCells> {
    if bins.len() != HISTOGRAM_BINS * HISTOGRAM_BINS || pixel_count <= 0.0 {
        return None;
    }

    let normalized = bins.iter().map(|bin| bin / pixel_count).collect::<Vec<_>>();
    let mut non_zero = normalized.iter().copied().filter(|value| *value > 0.0).collect::<Vec<_>>();
    non_zero.sort_by(f64::total_cmp);

    let max_count = *non_zero.last()?;
    let quantile_index = ((non_zero.len() as f64 * HEATMAP_UPPER_QUANTILE).floor() as usize).min(non_zero.len() - 1);
    let quantile_cap = non_zero[quantile_index];
    let cap = quantile_cap.max(max_count / HEATMAP_LEVELS as f64);

    let mut cells = [[HeatmapCell::Empty; HISTOGRAM_BINS]; HISTOGRAM_BINS];

    for (row_index, row) in cells.iter_mut().enumerate() {
        // rows run from high to low chroma while the bins are stored low to high
        let saturation_index = HISTOGRAM_BINS - 1 - row_index;

        for (lightness_index, cell) in row.iter_mut().enumerate() {
            let count = normalized[saturation_index * HISTOGRAM_BINS + lightness_index];
            if count <= 0.0 {
                continue;
            }

            let perceptual = (count / cap).clamp(0.0, 1.0).powf(HEATMAP_GAMMA);
            let level = (perceptual * (HEATMAP_LEVELS - 1) as f64).ceil() as u32;

            *cell = HeatmapCell::from_intensity(level);
        }
    }

    Some(cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_input_has_no_heatmap() {
        assert!(compute_heatmap_cells(&[0.0; 9], 10.0).is_none());
        assert!(compute_heatmap_cells(&[1.0; 9], 0.0).is_none());
        assert!(compute_heatmap_cells(&[1.0; 9], -1.0).is_none());
        assert!(compute_heatmap_cells(&[1.0; 4], 4.0).is_none());
    }

    #[test]
    fn single_bin_is_full_intensity() {
        let mut bins = [0.0; 9];
        // high chroma, mid lightness
        bins[2 * 3 + 1] = 4.0;

        let cells = compute_heatmap_cells(&bins, 4.0).unwrap();

        assert_eq!(cells[0][1].to_string(), "rgba(255,156,72,1.00)");
        for (row, column) in [(0, 0), (0, 2), (1, 0), (1, 1), (1, 2), (2, 0), (2, 1), (2, 2)] {
            assert_eq!(cells[row][column], HeatmapCell::Empty);
            assert_eq!(cells[row][column].to_string(), "transparent");
        }
    }

    #[test]
    fn rows_are_flipped_for_display() {
        let mut bins = [0.0; 9];
        // low chroma, low lightness
        bins[0] = 1.0;

        let cells = compute_heatmap_cells(&bins, 1.0).unwrap();

        assert!(!cells[2][0].is_empty());
        assert!(cells[0][0].is_empty());
    }

    #[test]
    fn small_bins_get_low_levels() {
        let mut bins = [0.0; 9];
        bins[0] = 99.0;
        bins[8] = 1.0;

        let cells = compute_heatmap_cells(&bins, 100.0).unwrap();

        // with two bins the cap is the largest one: 0.01 / 0.99, ^0.72 = 0.037, * 7 = 0.26 -> level 1
        match cells[0][2] {
            HeatmapCell::Filled { level, .. } => assert_eq!(level, 1),
            HeatmapCell::Empty => panic!("expected a filled cell"),
        }

        match cells[2][0] {
            HeatmapCell::Filled { level, .. } => assert_eq!(level, 7),
            HeatmapCell::Empty => panic!("expected a filled cell"),
        }
    }

    #[test]
    fn lowest_level_color_and_alpha() {
        assert_eq!(HeatmapCell::from_intensity(0).to_string(), "rgba(56,96,160,0.22)");
    }

    #[test]
    fn bins_are_left_untouched() {
        let bins = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
        let first = compute_heatmap_cells(&bins, 45.0);
        let second = compute_heatmap_cells(&bins, 45.0);

        assert_eq!(first, second);
        assert_eq!(bins, [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
    }
}
