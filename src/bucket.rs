use std::collections::{btree_map, BTreeMap};

const QUANTIZE_WORD_WIDTH: u32 = 5;

/// Weighted sums of every pixel that quantized into the same color key.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColorBucket {
    pub weight: f64,
    pub red_sum: f64,
    pub green_sum: f64,
    pub blue_sum: f64,
}

/// A map of quantized colors to their accumulated weights. Iteration happens in key order so everything built on top
/// of it stays deterministic.
#[derive(Debug, Clone, Default)]
pub struct ColorBuckets {
    buckets: BTreeMap<u16, ColorBucket>,
}

impl ColorBucket {
    fn add(&mut self, (r, g, b): (u8, u8, u8), weight: f64) {
        self.weight += weight;
        self.red_sum += r as f64 * weight;
        self.green_sum += g as f64 * weight;
        self.blue_sum += b as f64 * weight;
    }

    fn merge(&mut self, other: &ColorBucket) {
        self.weight += other.weight;
        self.red_sum += other.red_sum;
        self.green_sum += other.green_sum;
        self.blue_sum += other.blue_sum;
    }

    /// The weighted average color of the bucket, with channels in 0..1. Must only be called on a non-empty bucket.
    pub fn average_rgb(&self) -> (f64, f64, f64) {
        (
            (self.red_sum / self.weight / 255.0).clamp(0.0, 1.0),
            (self.green_sum / self.weight / 255.0).clamp(0.0, 1.0),
            (self.blue_sum / self.weight / 255.0).clamp(0.0, 1.0),
        )
    }
}

impl ColorBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, rgb: (u8, u8, u8), weight: f64) {
        if weight <= 0.0 {
            return;
        }

        self.buckets.entry(quantize_key(rgb)).or_default().add(rgb, weight);
    }

    pub fn merge(&mut self, other: &ColorBuckets) {
        for (key, bucket) in &other.buckets {
            self.buckets.entry(*key).or_default().merge(bucket);
        }
    }

    /// The bucket with the greatest weight. On equal weights the one with the lowest key wins.
    pub fn dominant(&self) -> Option<&ColorBucket> {
        let mut dominant: Option<&ColorBucket> = None;

        for bucket in self.buckets.values() {
            if dominant.map_or(true, |current| bucket.weight > current.weight) {
                dominant = Some(bucket);
            }
        }

        dominant
    }

    pub fn total_weight(&self) -> f64 {
        self.buckets.values().map(|bucket| bucket.weight).sum()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, u16, ColorBucket> {
        self.buckets.iter()
    }
}

/// Pack the top five bits of each channel into a 15-bit key, red being the most significant.
pub fn quantize_key((r, g, b): (u8, u8, u8)) -> u16 {
    let r = quantize_channel(r);
    let g = quantize_channel(g);
    let b = quantize_channel(b);

    (r << (QUANTIZE_WORD_WIDTH + QUANTIZE_WORD_WIDTH)) | (g << QUANTIZE_WORD_WIDTH) | b
}

fn quantize_channel(value: u8) -> u16 {
    (value >> (8 - QUANTIZE_WORD_WIDTH)) as u16
}
