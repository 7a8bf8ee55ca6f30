use image::{DynamicImage, GenericImageView, imageops::FilterType};
use tracing::debug;

/// Downscale `img` so that its longest side is at most `max_side`, keeping the
/// aspect ratio. Images that already fit (or `max_side == 0`) are returned as is.
pub fn fit_within(img: DynamicImage, max_side: u32) -> DynamicImage {
    let (orig_w, orig_h) = img.dimensions();
    if max_side == 0 || (orig_w <= max_side && orig_h <= max_side) {
        return img;
    }

    let (w, h) = scaled_dimensions(orig_w, orig_h, max_side);
    debug!(orig_w, orig_h, w, h, "downscaling image for analysis");
    DynamicImage::ImageRgba8(image::imageops::resize(&img, w, h, FilterType::Lanczos3))
}

/// Dimensions with the longest side equal to `max_side`; neither side drops below 1.
pub fn scaled_dimensions(orig_w: u32, orig_h: u32, max_side: u32) -> (u32, u32) {
    let longest = orig_w.max(orig_h) as f32;
    let ratio = max_side as f32 / longest;
    let w = ((orig_w as f32) * ratio).round().max(1.0) as u32;
    let h = ((orig_h as f32) * ratio).round().max(1.0) as u32;
    (w, h)
}
