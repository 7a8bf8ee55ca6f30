//! Image input handling: raw encoded bytes or a local file.

use std::fs;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use tracing::debug;

use crate::error::{KeyColorsError, Result};

/// Anything shorter than this cannot be a real encoded image.
pub const MIN_IMAGE_BYTES: usize = 100;

/// Extensions offered by the node's file browser.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "ico", "webp"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    /// Encoded image data (PNG, JPEG, ...).
    Bytes(Vec<u8>),
    /// Path to an image file on disk.
    File(PathBuf),
}

impl ImageSource {
    /// Short human readable identifier, used in logs.
    pub fn describe(&self) -> String {
        match self {
            ImageSource::Bytes(bytes) => format!("<{} bytes>", bytes.len()),
            ImageSource::File(path) => path.display().to_string(),
        }
    }

    /// Return the encoded image data, rejecting empty or truncated input.
    pub fn load_bytes(&self) -> Result<Vec<u8>> {
        let bytes = match self {
            ImageSource::Bytes(bytes) => bytes.clone(),
            ImageSource::File(path) => fs::read(path).map_err(|source| KeyColorsError::Io {
                path: path.clone(),
                source,
            })?,
        };
        check_len(&bytes)?;
        debug!(source = %self.describe(), len = bytes.len(), "loaded image data");
        Ok(bytes)
    }

    pub fn decode(&self) -> Result<DynamicImage> {
        decode(&self.load_bytes()?)
    }
}

fn check_len(bytes: &[u8]) -> Result<()> {
    if bytes.len() < MIN_IMAGE_BYTES {
        return Err(KeyColorsError::ImageTooSmall { len: bytes.len() });
    }
    Ok(())
}

/// Decode encoded image bytes, applying the same size guard as [`ImageSource::load_bytes`].
pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    check_len(bytes)?;
    image::load_from_memory(bytes).map_err(|e| KeyColorsError::image_load("Unable to decode image", e))
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        ImageSource::Bytes(bytes)
    }
}

impl From<&[u8]> for ImageSource {
    fn from(bytes: &[u8]) -> Self {
        ImageSource::Bytes(bytes.to_vec())
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::File(path)
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        ImageSource::File(path.to_path_buf())
    }
}
