use std::collections::HashSet;

use image::RgbaImage;
use kmeans_colors::{Kmeans, Sort, get_kmeans};
use palette::{IntoColor, Lab, LinSrgb, Srgb};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Quantizer;
use crate::color::{Color, Swatch};
use crate::error::{KeyColorsError, Result};

/// `kmeans_colors` stores cluster assignments as `u8`.
const MAX_CLUSTERS: usize = 256;

/// Tuning for the k-means quantizer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KMeansOptions {
    pub max_iter: usize,
    pub converge: f32,
    /// Independent runs with successive seeds; the lowest score wins.
    pub runs: u32,
    pub seed: u64,
}

impl Default for KMeansOptions {
    fn default() -> Self {
        Self {
            max_iter: 20,
            converge: 1e-4,
            runs: 3,
            seed: 0,
        }
    }
}

/// K-means clustering in CIE Lab space.
#[derive(Clone, Debug, Default)]
pub struct KMeans {
    options: KMeansOptions,
}

impl KMeans {
    pub fn new(options: KMeansOptions) -> Self {
        Self { options }
    }
}

impl Quantizer for KMeans {
    fn quantize(&self, image: &RgbaImage, max_colors: usize) -> Result<Vec<Swatch>> {
        if max_colors == 0 {
            return Ok(Vec::new());
        }

        // Collect Lab pixels from non-transparent areas
        let mut distinct: HashSet<[u8; 3]> = HashSet::new();
        let mut lab_pixels: Vec<Lab> = Vec::with_capacity((image.width() * image.height()) as usize);
        for chunk in image.as_raw().chunks(4) {
            if chunk[3] == 0 {
                continue;
            }
            distinct.insert([chunk[0], chunk[1], chunk[2]]);
            let linear: LinSrgb = Srgb::<u8>::new(chunk[0], chunk[1], chunk[2]).into_linear();
            lab_pixels.push(linear.into_color());
        }
        if lab_pixels.is_empty() {
            return Err(KeyColorsError::NoUsablePixels);
        }

        // More clusters than distinct colors only yields empty clusters.
        let k = max_colors.min(distinct.len()).min(MAX_CLUSTERS);
        let mut best = Kmeans::<Lab>::new();
        for run in 0..self.options.runs.max(1) {
            let result = get_kmeans(
                k,
                self.options.max_iter,
                self.options.converge,
                false,
                &lab_pixels,
                self.options.seed + run as u64,
            );
            if result.score < best.score {
                best = result;
            }
        }
        debug!(k, score = best.score, pixels = lab_pixels.len(), "k-means finished");

        let mut sorted = Lab::sort_indexed_colors(&best.centroids, &best.indices);
        sorted.sort_unstable_by(|a, b| b.percentage.total_cmp(&a.percentage));

        let total = lab_pixels.len() as f32;
        Ok(sorted
            .iter()
            .filter(|data| data.percentage > 0.0)
            .map(|data| {
                let linear: LinSrgb = data.centroid.into_color();
                let rgb_f32: Srgb<f32> = Srgb::from_linear(linear);
                Swatch {
                    color: Color::from(rgb_f32.into_format::<u8>()),
                    population: (data.percentage * total).round() as usize,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantize::test_images::three_bands;
    use image::Rgba;

    #[test]
    fn finds_the_three_bands_in_share_order() {
        let swatches = KMeans::default().quantize(&three_bands(), 8).unwrap();
        assert_eq!(swatches.len(), 3);

        let expected = [Color::new(255, 0, 0), Color::new(0, 0, 255), Color::new(0, 255, 0)];
        for (swatch, want) in swatches.iter().zip(expected) {
            assert!(swatch.color.distance(&want) < 3.0, "{} vs {}", swatch.color, want);
        }
        assert_eq!(swatches[0].population, 600);
        assert_eq!(swatches[1].population, 300);
        assert_eq!(swatches[2].population, 100);
    }

    #[test]
    fn cluster_count_is_capped_at_u8_range() {
        let gradient = RgbaImage::from_fn(64, 64, |x, y| Rgba([(x * 4) as u8, (y * 4) as u8, 128, 255]));
        let quantizer = KMeans::new(KMeansOptions { runs: 1, ..KMeansOptions::default() });
        let swatches = quantizer.quantize(&gradient, 400).unwrap();
        assert!(swatches.len() <= MAX_CLUSTERS, "{}", swatches.len());
        assert_eq!(swatches.iter().map(|s| s.population).sum::<usize>(), 64 * 64);
    }

    #[test]
    fn transparent_pixels_are_ignored() {
        let img = RgbaImage::from_fn(20, 20, |x, _| {
            if x < 10 { Rgba([10, 200, 30, 255]) } else { Rgba([250, 250, 0, 0]) }
        });
        let swatches = KMeans::default().quantize(&img, 4).unwrap();
        assert_eq!(swatches.len(), 1);
        assert!(swatches[0].color.distance(&Color::new(10, 200, 30)) < 3.0);
    }

    #[test]
    fn fully_transparent_image_has_no_pixels() {
        let img = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 0]));
        let err = KMeans::default().quantize(&img, 3).unwrap_err();
        assert!(matches!(err, KeyColorsError::NoUsablePixels));
    }
}
