//! Weighted k-means over the quantized color buckets, followed by ranking and perceptual deduplication.

use crate::{
    bucket::ColorBuckets,
    color::{self, Lab},
    swatch::Swatch,
};
use log::debug;
use std::cmp::Ordering;

pub const PALETTE_SIZE: usize = 8;
pub const PALETTE_KMEANS_ITERATIONS: usize = 16;
/// Swatches closer than this in CIELAB are considered near-duplicates.
pub const PALETTE_MIN_LAB_DISTANCE: f64 = 12.0;

// score = weight * (base + vividness * saturation / 100)
const FIRST_SEED_BASE: f64 = 0.6;
const FIRST_SEED_VIVIDNESS: f64 = 0.4;
const NEXT_SEED_BASE: f64 = 0.5;
const NEXT_SEED_VIVIDNESS: f64 = 0.5;
const RANK_BASE: f64 = 0.7;
const RANK_VIVIDNESS: f64 = 0.3;

/// A weighted color taking part in clustering. Clusters and the points they're built from share the same shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaletteCluster {
    pub weight: f64,
    /// sRGB in 0..1
    pub rgb: (f64, f64, f64),
    pub lab: Lab,
    /// HSV saturation in 0..100
    pub saturation: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct ClusterSums {
    weight: f64,
    red: f64,
    green: f64,
    blue: f64,
    l: f64,
    a: f64,
    b: f64,
    saturation: f64,
}

impl PaletteCluster {
    fn vividness(&self) -> f64 {
        self.saturation / 100.0
    }

    fn swatch(&self, pixel_count: f64) -> Swatch {
        let (r, g, b) = self.rgb;

        Swatch::new((to_channel(r), to_channel(g), to_channel(b)), self.weight / pixel_count)
    }
}

impl ClusterSums {
    fn add(&mut self, point: &PaletteCluster) {
        let w = point.weight;

        self.weight += w;
        self.red += point.rgb.0 * w;
        self.green += point.rgb.1 * w;
        self.blue += point.rgb.2 * w;
        self.l += point.lab.l * w;
        self.a += point.lab.a * w;
        self.b += point.lab.b * w;
        self.saturation += point.saturation * w;
    }

    fn mean_lab(&self) -> Lab {
        Lab::new(self.l / self.weight, self.a / self.weight, self.b / self.weight)
    }

    fn into_cluster(self) -> Option<PaletteCluster> {
        if self.weight <= 0.0 {
            return None;
        }

        Some(PaletteCluster {
            weight: self.weight,
            rgb: (self.red / self.weight, self.green / self.weight, self.blue / self.weight),
            lab: self.mean_lab(),
            saturation: self.saturation / self.weight,
        })
    }
}

/// Turn every non-empty bucket into a weighted point, in bucket key order.
pub fn build_points(buckets: &ColorBuckets) -> Vec<PaletteCluster> {
    buckets
        .iter()
        .filter(|(_, bucket)| bucket.weight > 0.0)
        .map(|(_, bucket)| {
            let (r, g, b) = bucket.average_rgb();

            PaletteCluster {
                weight: bucket.weight,
                rgb: (r, g, b),
                lab: color::rgb_to_lab(r, g, b),
                saturation: color::hsv_saturation(r, g, b),
            }
        })
        .collect()
}

/// Pick up to `count` initial centers: the heaviest vivid point first, then repeatedly the point farthest from every
/// chosen center, weighted by its mass and vividness. The first point encountered wins ties.
pub fn seed_centers(points: &[PaletteCluster], count: usize) -> Vec<Lab> {
    let mut centers = Vec::with_capacity(count);
    if count == 0 {
        return centers;
    }

    let mut first: Option<(f64, &PaletteCluster)> = None;
    for point in points {
        let score = point.weight * (FIRST_SEED_BASE + FIRST_SEED_VIVIDNESS * point.vividness());

        if first.map_or(true, |(best, _)| score > best) {
            first = Some((score, point));
        }
    }

    match first {
        Some((_, point)) => centers.push(point.lab),
        None => return centers,
    }

    while centers.len() < count {
        let mut best: Option<(f64, &PaletteCluster)> = None;

        for point in points {
            let min_distance = centers
                .iter()
                .map(|center| point.lab.distance_squared(*center))
                .fold(f64::INFINITY, f64::min);
            let score = min_distance * point.weight * (NEXT_SEED_BASE + NEXT_SEED_VIVIDNESS * point.vividness());

            if score > best.map_or(-1.0, |(best, _)| best) {
                best = Some((score, point));
            }
        }

        match best {
            Some((_, point)) => centers.push(point.lab),
            None => break,
        }
    }

    centers
}

fn nearest_center(lab: Lab, centers: &[Lab]) -> usize {
    let mut nearest = 0;
    let mut nearest_distance = f64::INFINITY;

    for (index, center) in centers.iter().enumerate() {
        let distance = lab.distance_squared(*center);

        if distance < nearest_distance {
            nearest_distance = distance;
            nearest = index;
        }
    }

    nearest
}

/// Cluster the points into at most `count` weighted clusters. Empty clusters are dropped.
pub fn build_clusters(points: &[PaletteCluster], count: usize) -> Vec<PaletteCluster> {
    if points.is_empty() || count == 0 {
        return Vec::new();
    }

    let mut centers = seed_centers(points, count);
    if centers.is_empty() {
        return Vec::new();
    }

    refine_clusters(points, &mut centers)
}

/// Run Lloyd's algorithm from the given centers and aggregate the points into one cluster per center that ended up
/// with any weight. The centers are left at their final positions.
fn refine_clusters(points: &[PaletteCluster], centers: &mut [Lab]) -> Vec<PaletteCluster> {
    let mut assignments: Vec<Option<usize>> = vec![None; points.len()];
    let mut iterations = 0;

    while iterations < PALETTE_KMEANS_ITERATIONS {
        iterations += 1;

        let mut sums = vec![ClusterSums::default(); centers.len()];
        let mut changed = false;

        for (point, assignment) in points.iter().zip(assignments.iter_mut()) {
            let nearest = nearest_center(point.lab, centers);

            if *assignment != Some(nearest) {
                *assignment = Some(nearest);
                changed = true;
            }

            sums[nearest].add(point);
        }

        // a center nothing was assigned to keeps its previous position
        for (center, sum) in centers.iter_mut().zip(&sums) {
            if sum.weight > 0.0 {
                *center = sum.mean_lab();
            }
        }

        if !changed {
            break;
        }
    }

    debug!("Clustered {} points into {} centers in {} iterations", points.len(), centers.len(), iterations);

    // aggregate from the final assignments rather than the centers, which may have moved after the last assignment
    let mut sums = vec![ClusterSums::default(); centers.len()];
    for (point, assignment) in points.iter().zip(&assignments) {
        if let Some(index) = assignment {
            sums[*index].add(point);
        }
    }

    sums.into_iter().filter_map(ClusterSums::into_cluster).collect()
}

/// Order clusters by their share of the total weight, boosted by saturation, most prominent first.
pub fn rank_clusters(mut clusters: Vec<PaletteCluster>) -> Vec<PaletteCluster> {
    let total_weight: f64 = clusters.iter().map(|cluster| cluster.weight).sum();
    let total_weight = if total_weight > 0.0 { total_weight } else { 1.0 };

    let score =
        |cluster: &PaletteCluster| (cluster.weight / total_weight) * (RANK_BASE + RANK_VIVIDNESS * cluster.vividness());

    clusters.sort_by(|left, right| score(right).partial_cmp(&score(left)).unwrap_or(Ordering::Equal));
    clusters
}

/// Greedily pick ranked clusters, skipping near-duplicates of already picked ones. If that leaves the palette short,
/// the skipped clusters fill it back up in rank order.
pub fn select_distinct(ranked: &[PaletteCluster], size: usize) -> Vec<PaletteCluster> {
    let threshold2 = PALETTE_MIN_LAB_DISTANCE * PALETTE_MIN_LAB_DISTANCE;
    let mut selected: Vec<usize> = Vec::with_capacity(size);

    for (index, candidate) in ranked.iter().enumerate() {
        if selected.len() >= size {
            break;
        }

        let is_near = selected
            .iter()
            .any(|&picked| candidate.lab.distance_squared(ranked[picked].lab) < threshold2);

        if !is_near {
            selected.push(index);
        }
    }

    if selected.len() < size {
        let skipped = (0..ranked.len()).filter(|index| !selected.contains(index)).collect::<Vec<_>>();

        for index in skipped {
            if selected.len() >= size {
                break;
            }

            selected.push(index);
        }
    }

    selected.into_iter().map(|index| ranked[index]).collect()
}

/// Build the final palette from the sampled color buckets.
pub fn extract_palette(buckets: &ColorBuckets, pixel_count: f64) -> Vec<Swatch> {
    if pixel_count <= 0.0 || buckets.is_empty() {
        return Vec::new();
    }

    let points = build_points(buckets);
    let clusters = build_clusters(&points, PALETTE_SIZE.min(points.len()));
    if clusters.is_empty() {
        return Vec::new();
    }

    let ranked = rank_clusters(clusters);

    select_distinct(&ranked, PALETTE_SIZE)
        .iter()
        .map(|cluster| cluster.swatch(pixel_count))
        .collect()
}

fn to_channel(value: f64) -> u8 {
    (value * 255.0).clamp(0.0, 255.0).round() as u8
}
