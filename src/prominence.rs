//! Pixel-frequency re-ranking and near-duplicate removal.
//!
//! Quantizers tend to over-represent colors that span a large region of color
//! space. Counting how many image pixels actually sit close to each palette
//! entry gives an ordering that tracks what a viewer sees as dominant.

use tracing::debug;

use crate::color::Color;
use crate::error::{KeyColorsError, Result};

/// Default RGB distance under which two colors are considered the same.
pub const DEFAULT_MATCH_DISTANCE: f32 = 30.0;

/// A palette color with the number of pixels attributed to it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ranked {
    pub color: Color,
    pub count: usize,
}

/// Number of `pixels` within `threshold` (inclusive) of `color`.
pub fn count_matches(color: &Color, pixels: &[Color], threshold: f32) -> usize {
    let limit = threshold * threshold;
    pixels
        .iter()
        .filter(|p| color.distance_squared(p) as f32 <= limit)
        .count()
}

/// Pair each palette color with its pixel match count, most matched first.
/// Ties keep palette order.
pub fn rank_by_prominence(palette: &[Color], pixels: &[Color], threshold: f32) -> Result<Vec<Ranked>> {
    if pixels.is_empty() {
        return Err(KeyColorsError::NoUsablePixels);
    }
    let mut ranked: Vec<Ranked> = palette
        .iter()
        .map(|color| {
            let count = count_matches(color, pixels, threshold);
            debug!("palette color {color} matches {count} pixels");
            Ranked { color: *color, count }
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    Ok(ranked)
}

/// Walk `candidates` in order and keep up to `n` colors, skipping any closer
/// than `threshold` to one already kept.
pub fn select_distinct(candidates: &[Ranked], n: usize, threshold: f32) -> Vec<Ranked> {
    let mut selected: Vec<Ranked> = Vec::with_capacity(n.min(candidates.len()));
    for candidate in candidates {
        if selected.len() >= n {
            break;
        }
        if selected
            .iter()
            .any(|kept| kept.color.distance(&candidate.color) < threshold)
        {
            continue;
        }
        debug!(count = candidate.count, "selected color {}", candidate.color);
        selected.push(*candidate);
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(r: u8, g: u8, b: u8, count: usize) -> Ranked {
        Ranked {
            color: Color::new(r, g, b),
            count,
        }
    }

    #[test]
    fn match_threshold_is_inclusive() {
        let pixels = [Color::new(30, 0, 0), Color::new(31, 0, 0), Color::new(0, 0, 0)];
        assert_eq!(count_matches(&Color::new(0, 0, 0), &pixels, 30.0), 2);
    }

    #[test]
    fn reorders_by_pixel_count() {
        let palette = [Color::new(0, 0, 255), Color::new(255, 0, 0)];
        let mut pixels = vec![Color::new(250, 5, 5); 7];
        pixels.extend(vec![Color::new(0, 0, 250); 3]);

        let order = rank_by_prominence(&palette, &pixels, 30.0).unwrap();
        assert_eq!(order, vec![ranked(255, 0, 0, 7), ranked(0, 0, 255, 3)]);
    }

    #[test]
    fn ties_keep_palette_order() {
        let palette = [Color::new(10, 10, 10), Color::new(200, 200, 200)];
        let order = rank_by_prominence(&palette, &[Color::new(100, 100, 100)], 30.0).unwrap();
        assert_eq!(order[0].color, Color::new(10, 10, 10));
        assert_eq!(order[1].color, Color::new(200, 200, 200));
    }

    #[test]
    fn empty_pixels_is_an_error() {
        assert!(rank_by_prominence(&[Color::new(1, 2, 3)], &[], 30.0).is_err());
    }

    #[test]
    fn drops_near_duplicates() {
        let candidates = [
            ranked(200, 0, 0, 50),
            ranked(210, 10, 0, 40),
            ranked(0, 0, 200, 30),
            ranked(0, 200, 0, 20),
        ];
        let picked = select_distinct(&candidates, 3, 30.0);
        let colors: Vec<Color> = picked.iter().map(|r| r.color).collect();
        assert_eq!(colors, vec![Color::new(200, 0, 0), Color::new(0, 0, 200), Color::new(0, 200, 0)]);
    }

    #[test]
    fn may_return_fewer_than_requested() {
        let candidates = [ranked(100, 100, 100, 5), ranked(105, 100, 100, 4)];
        assert_eq!(select_distinct(&candidates, 3, 30.0).len(), 1);
    }

    #[test]
    fn unbounded_request_takes_every_distinct_candidate() {
        let candidates = [ranked(0, 0, 0, 5), ranked(200, 0, 0, 4)];
        assert_eq!(select_distinct(&candidates, usize::MAX, 30.0).len(), 2);
    }

    #[test]
    fn distance_exactly_at_threshold_is_kept() {
        let candidates = [ranked(0, 0, 0, 5), ranked(30, 0, 0, 4)];
        assert_eq!(select_distinct(&candidates, 2, 30.0).len(), 2);
    }
}
