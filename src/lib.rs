//! Key color extraction.
//!
//! Finds the dominant colors of an image with k-means or median-cut
//! clustering, optionally re-ranks them by how many pixels actually match each
//! color, removes near-duplicates and publishes the result through the
//! [`ExtractKeyColors`] node as `color_<n>` hex parameters.
//!
//! ```no_run
//! use keycolors::{ExtractOptions, extract_key_colors};
//!
//! let bytes = std::fs::read("photo.jpg")?;
//! for key in extract_key_colors(&bytes, &ExtractOptions::default())? {
//!     println!("{}", key.hex());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use js_sys::Array;
use wasm_bindgen::prelude::*;

pub mod color;
pub mod config;
pub mod error;
pub mod extract;
pub mod node;
pub mod prominence;
pub mod quantize;
pub mod resize;
pub mod source;

pub use color::{Color, Swatch};
pub use config::ExtractOptions;
pub use error::{KeyColorsError, Result};
pub use extract::{KeyColor, extract_from_image, extract_key_colors};
pub use node::{ExtractKeyColors, ParameterValue};
pub use quantize::{Method, Quantizer};
pub use source::ImageSource;

// ------------------------------------------------------------
// JavaScript entry point
// ------------------------------------------------------------

/// Extract key colors from encoded image bytes.
///
/// Returns an array of lowercase `#rrggbb` strings, most dominant first.
/// `method` is `"kmeans"` or `"median-cut"` (default); `rerank` defaults to
/// `true`.
#[wasm_bindgen(js_name = extractKeyColors)]
pub fn extract_key_colors_js(
    input: Vec<u8>,
    num_colors: usize,
    method: Option<String>,
    rerank: Option<bool>,
) -> std::result::Result<Array, JsValue> {
    let hexes = hex_colors(&input, num_colors, method.as_deref(), rerank)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(hexes.iter().map(|hex| JsValue::from_str(hex)).collect())
}

/// Options and output mapping behind [`extract_key_colors_js`].
fn hex_colors(input: &[u8], num_colors: usize, method: Option<&str>, rerank: Option<bool>) -> Result<Vec<String>> {
    let method = method.map(str::parse::<Method>).transpose()?.unwrap_or_default();
    let options = ExtractOptions {
        method,
        num_colors,
        rerank: rerank.unwrap_or(true),
        ..ExtractOptions::default()
    };
    Ok(extract_key_colors(input, &options)?
        .iter()
        .map(KeyColor::hex)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn two_tone_bmp() -> Vec<u8> {
        let img = RgbImage::from_fn(40, 10, |x, _| if x < 30 { Rgb([0, 128, 0]) } else { Rgb([128, 0, 128]) });
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Bmp)
            .unwrap();
        buf
    }

    #[test]
    fn defaults_to_reranked_median_cut() {
        let hexes = hex_colors(&two_tone_bmp(), 2, None, None).unwrap();
        assert_eq!(hexes, vec!["#048404", "#840484"]);
    }

    #[test]
    fn accepts_method_names() {
        let hexes = hex_colors(&two_tone_bmp(), 2, Some("kmeans"), Some(false)).unwrap();
        assert_eq!(hexes.len(), 2);
        assert!(hexes.iter().all(|h| h.len() == 7 && h.starts_with('#')));
    }

    #[test]
    fn rejects_unknown_method_and_bad_counts() {
        let bytes = two_tone_bmp();
        assert!(matches!(
            hex_colors(&bytes, 2, Some("octree"), None),
            Err(KeyColorsError::UnknownMethod(_))
        ));
        for n in [0, 13, usize::MAX] {
            assert!(matches!(
                hex_colors(&bytes, n, None, None),
                Err(KeyColorsError::InvalidParameter { .. })
            ));
        }
    }
}
