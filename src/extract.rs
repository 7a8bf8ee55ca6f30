use image::DynamicImage;
use serde::Serialize;
use tracing::{debug, warn};

use crate::color::{Color, Swatch};
use crate::config::ExtractOptions;
use crate::error::Result;
use crate::prominence::{Ranked, rank_by_prominence, select_distinct};
use crate::quantize::Quantizer;
use crate::resize::fit_within;
use crate::source;

/// One extracted key color.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct KeyColor {
    pub color: Color,
    /// Matching pixels when re-ranked, otherwise the quantizer's population.
    pub pixel_count: usize,
}

impl KeyColor {
    pub fn hex(&self) -> String {
        self.color.hex()
    }
}

/// Decode `input` and extract its key colors, most dominant first.
pub fn extract_key_colors(input: &[u8], options: &ExtractOptions) -> Result<Vec<KeyColor>> {
    let img = source::decode(input)?;
    extract_from_image(img, options)
}

/// Extract key colors from an already decoded image.
///
/// Steps performed:
/// 1. Downscale so the longest side is at most `max_side`.
/// 2. Build a candidate palette of `palette_size()` colors with the configured quantizer.
/// 3. Optionally re-order the candidates by how many pixels sit within `match_distance`.
/// 4. Drop near-duplicates and keep the first `num_colors`.
pub fn extract_from_image(img: DynamicImage, options: &ExtractOptions) -> Result<Vec<KeyColor>> {
    options.validate()?;
    debug!(num_colors = options.num_colors, method = %options.method, "extracting key colors");

    let working = fit_within(img, options.max_side).to_rgba8();
    let palette = options.quantizer().quantize(&working, options.palette_size())?;
    debug!("{} extracted {} candidate colors", options.method, palette.len());

    let candidates = if options.rerank {
        let pixels: Vec<Color> = working
            .pixels()
            .filter(|p| p.0[3] > 0)
            .map(|p| Color::new(p.0[0], p.0[1], p.0[2]))
            .collect();
        rerank_or_fallback(&palette, &pixels, options)
    } else {
        quantizer_order(&palette)
    };

    let selected = select_distinct(&candidates, options.num_colors, options.match_distance);
    for (i, ranked) in selected.iter().enumerate() {
        debug!("  color {}: {} | hex: {}", i + 1, ranked.color, ranked.color.hex());
    }
    Ok(selected
        .into_iter()
        .map(|r| KeyColor {
            color: r.color,
            pixel_count: r.count,
        })
        .collect())
}

/// Order `palette` by pixel matches, or keep the quantizer order when there
/// is nothing to count against.
///
/// A quantizer that succeeded has already seen opaque pixels, so in the
/// pipeline the fallback only guards against callers handing in an empty
/// pixel set. Duplicate removal still runs on the fallback order.
fn rerank_or_fallback(palette: &[Swatch], pixels: &[Color], options: &ExtractOptions) -> Vec<Ranked> {
    let colors: Vec<Color> = palette.iter().map(|s| s.color).collect();
    match rank_by_prominence(&colors, pixels, options.match_distance) {
        Ok(ranked) => ranked,
        Err(e) => {
            warn!("prominence ordering failed: {e}, using {} palette order", options.method);
            quantizer_order(palette)
        }
    }
}

fn quantizer_order(palette: &[Swatch]) -> Vec<Ranked> {
    palette
        .iter()
        .map(|s| Ranked {
            color: s.color,
            count: s.population,
        })
        .collect()
}
