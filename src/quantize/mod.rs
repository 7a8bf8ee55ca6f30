//! Palette quantizers.
//!
//! A [`Quantizer`] reduces an image to at most `max_colors` representative
//! colors, ordered most prominent first by its own measure.

use std::fmt;
use std::str::FromStr;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::color::Swatch;
use crate::error::{KeyColorsError, Result};

pub mod kmeans;
pub mod median_cut;

pub use kmeans::{KMeans, KMeansOptions};
pub use median_cut::{MedianCut, MedianCutOptions};

pub trait Quantizer {
    fn quantize(&self, image: &RgbaImage, max_colors: usize) -> Result<Vec<Swatch>>;
}

/// Clustering algorithm used to build the candidate palette.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    #[serde(rename = "kmeans")]
    KMeans,
    #[default]
    MedianCut,
}

impl FromStr for Method {
    type Err = KeyColorsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kmeans" | "k-means" => Ok(Method::KMeans),
            "median-cut" | "median_cut" | "mediancut" | "mmcq" => Ok(Method::MedianCut),
            _ => Err(KeyColorsError::UnknownMethod(s.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::KMeans => f.write_str("kmeans"),
            Method::MedianCut => f.write_str("median-cut"),
        }
    }
}
