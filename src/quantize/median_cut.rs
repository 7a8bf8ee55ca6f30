//! Modified median cut quantization (MMCQ).
//!
//! Colors are bucketed into a 5-bit-per-channel histogram. The box covering all
//! populated buckets is repeatedly cut at its population median along the
//! longest axis: first by population until three quarters of the target box
//! count is reached, then by population times volume.

use std::cmp::Reverse;

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Quantizer;
use crate::color::{Color, Swatch};
use crate::error::{KeyColorsError, Result};

const SIGBITS: usize = 5;
const RSHIFT: usize = 8 - SIGBITS;
const SIDE: usize = 1 << SIGBITS;
const FRACT_BY_POPULATION: f64 = 0.75;
const MAX_ITERATIONS: usize = 1000;

/// Pixels below this alpha are skipped.
const MIN_ALPHA: u8 = 125;
/// Pixels with every channel above this are treated as background white.
const WHITE_THRESHOLD: u8 = 250;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MedianCutOptions {
    /// Sample every `quality`-th pixel; 1 reads every pixel.
    pub quality: u32,
}

impl Default for MedianCutOptions {
    fn default() -> Self {
        Self { quality: 10 }
    }
}

#[derive(Clone, Debug, Default)]
pub struct MedianCut {
    options: MedianCutOptions,
}

impl MedianCut {
    pub fn new(options: MedianCutOptions) -> Self {
        Self { options }
    }
}

type Cell = [usize; 3];

#[inline]
fn bucket_index([r, g, b]: Cell) -> usize {
    (r << (2 * SIGBITS)) | (g << SIGBITS) | b
}

fn cells(lo: Cell, hi: Cell) -> impl Iterator<Item = Cell> {
    (lo[0]..=hi[0]).flat_map(move |r| {
        (lo[1]..=hi[1]).flat_map(move |g| (lo[2]..=hi[2]).map(move |b| [r, g, b]))
    })
}

struct Histogram {
    buckets: Vec<u32>,
    total: u32,
}

impl Histogram {
    fn from_image(image: &RgbaImage, quality: u32) -> Self {
        let mut buckets = vec![0u32; 1 << (3 * SIGBITS)];
        let mut total = 0;
        for pixel in image.pixels().step_by(quality.max(1) as usize) {
            let [r, g, b, a] = pixel.0;
            if a < MIN_ALPHA || (r > WHITE_THRESHOLD && g > WHITE_THRESHOLD && b > WHITE_THRESHOLD) {
                continue;
            }
            let cell = [r as usize >> RSHIFT, g as usize >> RSHIFT, b as usize >> RSHIFT];
            buckets[bucket_index(cell)] += 1;
            total += 1;
        }
        Self { buckets, total }
    }

    #[inline]
    fn count(&self, cell: Cell) -> u32 {
        self.buckets[bucket_index(cell)]
    }
}

/// An axis-aligned box of histogram cells, bounds inclusive and tight around
/// its populated cells.
#[derive(Clone, Copy, Debug)]
struct VBox {
    lo: Cell,
    hi: Cell,
    population: u32,
}

impl VBox {
    /// Smallest box inside `lo..=hi` containing every populated cell, if any.
    fn fit(histogram: &Histogram, lo: Cell, hi: Cell) -> Option<Self> {
        let mut min = [usize::MAX; 3];
        let mut max = [0usize; 3];
        let mut population = 0;
        for cell in cells(lo, hi) {
            let count = histogram.count(cell);
            if count == 0 {
                continue;
            }
            population += count;
            for axis in 0..3 {
                min[axis] = min[axis].min(cell[axis]);
                max[axis] = max[axis].max(cell[axis]);
            }
        }
        (population > 0).then_some(Self {
            lo: min,
            hi: max,
            population,
        })
    }

    fn side(&self, axis: usize) -> usize {
        self.hi[axis] - self.lo[axis] + 1
    }

    fn volume(&self) -> u64 {
        (0..3).map(|axis| self.side(axis) as u64).product()
    }

    fn priority(&self) -> u64 {
        self.population as u64 * self.volume()
    }

    fn can_split(&self) -> bool {
        self.population > 1 && self.volume() > 1
    }

    fn longest_axis(&self) -> usize {
        let (r, g, b) = (self.side(0), self.side(1), self.side(2));
        if r >= g && r >= b {
            0
        } else if g >= b {
            1
        } else {
            2
        }
    }

    fn split(&self, histogram: &Histogram) -> Option<(VBox, VBox)> {
        if !self.can_split() {
            return None;
        }
        let axis = self.longest_axis();
        let (lo, hi) = (self.lo[axis], self.hi[axis]);

        // Cumulative population per slice along the axis.
        let mut partial = [0u32; SIDE];
        let mut running = 0;
        for v in lo..=hi {
            let mut slice_lo = self.lo;
            let mut slice_hi = self.hi;
            slice_lo[axis] = v;
            slice_hi[axis] = v;
            running += cells(slice_lo, slice_hi).map(|c| histogram.count(c)).sum::<u32>();
            partial[v] = running;
        }

        let median = (lo..=hi).find(|&v| partial[v] > running / 2)?;
        let left = median - lo;
        let right = hi - median;
        // Cut into the larger side, so thin dense slices stay whole.
        let cut = if left <= right {
            (median + right / 2).min(hi - 1)
        } else {
            (median as isize - 1 - (left / 2) as isize).max(lo as isize) as usize
        };

        let mut first_hi = self.hi;
        first_hi[axis] = cut;
        let mut second_lo = self.lo;
        second_lo[axis] = cut + 1;
        Some((VBox::fit(histogram, self.lo, first_hi)?, VBox::fit(histogram, second_lo, self.hi)?))
    }

    /// Histogram-weighted mean of the cell centres.
    fn average(&self, histogram: &Histogram) -> Color {
        let mult = (1 << RSHIFT) as f64;
        let mut sum = [0f64; 3];
        let mut total = 0f64;
        for cell in cells(self.lo, self.hi) {
            let count = histogram.count(cell) as f64;
            if count == 0.0 {
                continue;
            }
            total += count;
            for axis in 0..3 {
                sum[axis] += count * (cell[axis] as f64 + 0.5) * mult;
            }
        }
        let channel = |axis: usize| {
            let value = if total > 0.0 {
                sum[axis] / total
            } else {
                mult * (self.lo[axis] + self.hi[axis] + 1) as f64 / 2.0
            };
            value.round().clamp(0.0, 255.0) as u8
        };
        Color::new(channel(0), channel(1), channel(2))
    }
}

fn split_boxes(boxes: &mut Vec<VBox>, histogram: &Histogram, target: usize, key: impl Fn(&VBox) -> u64) {
    let mut iterations = 0;
    while boxes.len() < target && iterations < MAX_ITERATIONS {
        iterations += 1;
        let Some(pos) = boxes
            .iter()
            .enumerate()
            .filter(|(_, vbox)| vbox.can_split())
            .max_by_key(|(_, vbox)| key(vbox))
            .map(|(i, _)| i)
        else {
            break;
        };
        let vbox = boxes.swap_remove(pos);
        match vbox.split(histogram) {
            Some((a, b)) => {
                boxes.push(a);
                boxes.push(b);
            }
            None => {
                boxes.push(vbox);
                break;
            }
        }
    }
}

impl Quantizer for MedianCut {
    fn quantize(&self, image: &RgbaImage, max_colors: usize) -> Result<Vec<Swatch>> {
        if max_colors == 0 {
            return Ok(Vec::new());
        }
        let histogram = Histogram::from_image(image, self.options.quality);
        let root = VBox::fit(&histogram, [0; 3], [SIDE - 1; 3]).ok_or(KeyColorsError::NoUsablePixels)?;

        let mut boxes = vec![root];
        let population_target = ((FRACT_BY_POPULATION * max_colors as f64).ceil() as usize).max(1);
        split_boxes(&mut boxes, &histogram, population_target, |vbox| vbox.population as u64);
        split_boxes(&mut boxes, &histogram, max_colors, VBox::priority);
        boxes.sort_by_key(|vbox| Reverse(vbox.priority()));
        debug!(sampled = histogram.total, boxes = boxes.len(), "median cut finished");

        Ok(boxes
            .iter()
            .map(|vbox| Swatch {
                color: vbox.average(&histogram),
                population: vbox.population as usize,
            })
            .collect())
    }
}
