//! Error types for key color extraction.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, KeyColorsError>;

#[derive(Error, Debug)]
pub enum KeyColorsError {
    /// The node was processed without an `input_image` value.
    #[error("No input image provided")]
    MissingImage,

    /// Image data shorter than the minimum plausible encoded image.
    #[error("Image data is empty or too small ({len} bytes)")]
    ImageTooSmall { len: usize },

    /// Reading an image file from disk failed.
    #[error("Failed to read image file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bytes could not be decoded as an image.
    #[error("Failed to load image: {message}")]
    ImageLoad {
        message: String,
        #[source]
        source: image::ImageError,
    },

    /// Every pixel was filtered out (transparent, near-white, or an empty image).
    #[error("Image has no pixels usable for color analysis")]
    NoUsablePixels,

    #[error("Invalid parameter: {parameter} = {value}")]
    InvalidParameter { parameter: String, value: String },

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Invalid hex color: {0:?}")]
    InvalidHex(String),

    #[error("Unknown extraction method: {0:?}")]
    UnknownMethod(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl KeyColorsError {
    pub fn image_load(message: impl Into<String>, source: image::ImageError) -> Self {
        Self::ImageLoad {
            message: message.into(),
            source,
        }
    }

    pub fn invalid_parameter(parameter: impl Into<String>, value: impl ToString) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.to_string(),
        }
    }
}
