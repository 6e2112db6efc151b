//! Dominant-color extraction for sampled frames.
//!
//! [`analyze_image`] decodes a frame to RGB pixels and clusters them
//! with k-means. Output order is by hue/saturation/lightness of the
//! centroid, not by population, so visually similar frames produce
//! stably ordered color bars regardless of which centroid the iteration
//! happened to settle first.
//!
//! Everything here is synchronous, CPU-bound code; callers on the async
//! runtime must dispatch it through `spawn_blocking`.

use std::cmp::Ordering;
use std::path::Path;

use crate::error::StageError;
use crate::types::ColorCluster;

/// Default number of clusters per frame.
pub const DEFAULT_CLUSTERS: usize = 2;

/// Stop iterating once no centroid moved further than this (squared
/// distance in RGB space).
const CONVERGENCE_EPSILON: f64 = 1e-3;

/// Iteration bound for inputs that never settle.
const MAX_ITERATIONS: usize = 50;

/// Decode `path` and return its `k` dominant colors, HSL-sorted.
pub fn analyze_image(path: &Path, k: usize) -> Result<Vec<ColorCluster>, StageError> {
    let img = image::open(path)?.to_rgb8();
    let pixels: Vec<[f64; 3]> = img
        .pixels()
        .map(|p| [f64::from(p.0[0]), f64::from(p.0[1]), f64::from(p.0[2])])
        .collect();
    Ok(cluster_pixels(&pixels, k))
}

/// Run k-means over `pixels` and return HSL-ordered clusters with
/// integer population percentages.
pub fn cluster_pixels(pixels: &[[f64; 3]], k: usize) -> Vec<ColorCluster> {
    if pixels.is_empty() || k == 0 {
        return Vec::new();
    }

    let mut centroids = initial_centroids(pixels, k);
    let mut assignments = vec![0usize; pixels.len()];

    for _ in 0..MAX_ITERATIONS {
        for (slot, pixel) in assignments.iter_mut().zip(pixels) {
            *slot = nearest_centroid(pixel, &centroids);
        }

        let mut sums = vec![[0.0f64; 3]; centroids.len()];
        let mut counts = vec![0usize; centroids.len()];
        for (pixel, &cluster) in pixels.iter().zip(&assignments) {
            for channel in 0..3 {
                sums[cluster][channel] += pixel[channel];
            }
            counts[cluster] += 1;
        }

        let mut moved = 0.0f64;
        for (cluster, centroid) in centroids.iter_mut().enumerate() {
            // A cluster that attracted no pixels keeps its centroid.
            if counts[cluster] == 0 {
                continue;
            }
            let next = [
                sums[cluster][0] / counts[cluster] as f64,
                sums[cluster][1] / counts[cluster] as f64,
                sums[cluster][2] / counts[cluster] as f64,
            ];
            moved = moved.max(distance_sq(centroid, &next));
            *centroid = next;
        }
        if moved < CONVERGENCE_EPSILON {
            break;
        }
    }

    let mut counts = vec![0usize; centroids.len()];
    for &cluster in &assignments {
        counts[cluster] += 1;
    }

    let total = pixels.len() as f64;
    let mut clusters: Vec<ColorCluster> = centroids
        .iter()
        .zip(&counts)
        .map(|(centroid, &count)| ColorCluster {
            color_rgb: [
                centroid[0].round().clamp(0.0, 255.0) as u8,
                centroid[1].round().clamp(0.0, 255.0) as u8,
                centroid[2].round().clamp(0.0, 255.0) as u8,
            ],
            percentage: ((count as f64 / total) * 100.0).round() as u8,
        })
        .collect();

    clusters.sort_by(|a, b| compare_hsl(a.color_rgb, b.color_rgb));
    clusters
}

/// Deterministic initialization: `k` evenly spaced pixels of the input.
///
/// Repeated runs over identical pixels therefore converge identically,
/// which keeps the analysis idempotent without a randomness source.
fn initial_centroids(pixels: &[[f64; 3]], k: usize) -> Vec<[f64; 3]> {
    let k = k.min(pixels.len());
    (0..k).map(|i| pixels[i * pixels.len() / k]).collect()
}

/// Index of the centroid nearest to `pixel`; ties resolve to the lowest
/// index.
fn nearest_centroid(pixel: &[f64; 3], centroids: &[[f64; 3]]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, centroid) in centroids.iter().enumerate() {
        let dist = distance_sq(pixel, centroid);
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }
    best
}

fn distance_sq(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)
}

/// Order two colors by hue, then saturation, then lightness.
fn compare_hsl(a: [u8; 3], b: [u8; 3]) -> Ordering {
    let (ha, sa, la) = hsl_key(a);
    let (hb, sb, lb) = hsl_key(b);
    ha.total_cmp(&hb)
        .then(sa.total_cmp(&sb))
        .then(la.total_cmp(&lb))
}

/// Hue (degrees, `[0, 360)`), saturation and lightness (both `[0, 1]`)
/// of an RGB color. Achromatic colors report hue 0 and saturation 0.
fn hsl_key(rgb: [u8; 3]) -> (f64, f64, f64) {
    let r = f64::from(rgb[0]) / 255.0;
    let g = f64::from(rgb[1]) / 255.0;
    let b = f64::from(rgb[2]) / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let lightness = (max + min) / 2.0;
    let delta = max - min;

    if delta == 0.0 {
        return (0.0, 0.0, lightness);
    }

    let saturation = delta / (1.0 - (2.0 * lightness - 1.0).abs());
    let hue_sextant = if max == r {
        ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };

    (hue_sextant * 60.0, saturation, lightness)
}
