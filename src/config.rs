//! Tunable parameters for key color extraction.
//!
//! Options can be built in code or loaded from JSON; every field is optional in
//! the file and falls back to its default:
//!
//! ```json
//! { "method": "kmeans", "num_colors": 5, "kmeans": { "runs": 5 } }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{KeyColorsError, Result};
use crate::prominence::DEFAULT_MATCH_DISTANCE;
use crate::quantize::{KMeans, KMeansOptions, MedianCut, MedianCutOptions, Method, Quantizer};

/// Inclusive bounds on the number of key colors a caller may request.
pub const MIN_NUM_COLORS: usize = 1;
pub const MAX_NUM_COLORS: usize = 12;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    pub method: Method,
    /// Number of key colors to return.
    pub num_colors: usize,
    /// Re-order the candidate palette by how many pixels match each color.
    pub rerank: bool,
    /// Longest side of the working image; 0 keeps the original size.
    pub max_side: u32,
    /// RGB distance used both for pixel matching and duplicate removal.
    pub match_distance: f32,
    /// The candidate palette holds at least this many colors (or twice
    /// `num_colors`, whichever is larger) so dedup has room to work.
    pub palette_size_floor: usize,
    pub kmeans: KMeansOptions,
    pub median_cut: MedianCutOptions,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            method: Method::MedianCut,
            num_colors: 3,
            rerank: true,
            max_side: 400,
            match_distance: DEFAULT_MATCH_DISTANCE,
            palette_size_floor: 15,
            kmeans: KMeansOptions::default(),
            median_cut: MedianCutOptions::default(),
        }
    }
}

impl ExtractOptions {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| KeyColorsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Size of the candidate palette requested from the quantizer.
    pub fn palette_size(&self) -> usize {
        self.palette_size_floor.max(self.num_colors.saturating_mul(2))
    }

    pub fn quantizer(&self) -> Box<dyn Quantizer> {
        match self.method {
            Method::KMeans => Box::new(KMeans::new(self.kmeans)),
            Method::MedianCut => Box::new(MedianCut::new(self.median_cut)),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_NUM_COLORS..=MAX_NUM_COLORS).contains(&self.num_colors) {
            return Err(KeyColorsError::invalid_parameter("num_colors", self.num_colors));
        }
        if !self.match_distance.is_finite() || self.match_distance < 0.0 {
            return Err(KeyColorsError::invalid_parameter("match_distance", self.match_distance));
        }
        Ok(())
    }
}
