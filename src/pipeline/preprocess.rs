//! Image preprocessing: upscale, desaturate and contrast-stretch before OCR.
//!
//! OCR accuracy is very sensitive to resolution and contrast. This pass is
//! deterministic and parameter-free:
//!
//! 1. scale so the short side lands near 1200 px, never below 1.5× or
//!    above 2.5×
//! 2. convert every pixel to perceptual luma (`0.299R + 0.587G + 0.114B`)
//! 3. stretch contrast around 128 with gain 1.25, clamped to `0..=255`
//! 4. re-encode as PNG (lossless)
//!
//! Sources larger than [`MAX_SOURCE_PIXELS`] are rejected from their header
//! alone, before any pixel data is decoded.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, GrayImage, ImageError, ImageFormat, ImageReader, Luma};
use std::io::Cursor;
use thiserror::Error;
use tracing::debug;

/// Target length of the short side after scaling.
const TARGET_SHORT_SIDE: f64 = 1200.0;
const MIN_SCALE: f64 = 1.5;
const MAX_SCALE: f64 = 2.5;
const CONTRAST_GAIN: f64 = 1.25;
const CONTRAST_MIDPOINT: f64 = 128.0;

/// Largest source image accepted, in pixels. Scaling multiplies the area
/// by at least 2.25, so a 4000×4000 scan already becomes 36 MP.
pub const MAX_SOURCE_PIXELS: u64 = 16_000_000;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("could not decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("image has zero width or height")]
    EmptyImage,

    #[error("image is {width}x{height} pixels; at most {max_pixels} pixels are supported")]
    TooLarge {
        width: u32,
        height: u32,
        max_pixels: u64,
    },

    #[error("could not encode preprocessed image: {0}")]
    Encode(#[source] image::ImageError),
}

/// Preprocess encoded image bytes into a PNG ready for OCR.
pub fn preprocess(image_bytes: &[u8]) -> Result<Vec<u8>, PreprocessError> {
    preprocess_with_limit(image_bytes, MAX_SOURCE_PIXELS)
}

/// [`preprocess`] with a custom ceiling on the source pixel count.
///
/// Dimensions are read from the image header, before any pixel data is
/// decoded.
pub fn preprocess_with_limit(image_bytes: &[u8], max_pixels: u64) -> Result<Vec<u8>, PreprocessError> {
    let (width, height) = ImageReader::new(Cursor::new(image_bytes))
        .with_guessed_format()
        .map_err(|e| PreprocessError::Decode(ImageError::IoError(e)))?
        .into_dimensions()
        .map_err(PreprocessError::Decode)?;
    if u64::from(width) * u64::from(height) > max_pixels {
        return Err(PreprocessError::TooLarge {
            width,
            height,
            max_pixels,
        });
    }

    let img = image::load_from_memory(image_bytes).map_err(PreprocessError::Decode)?;
    let enhanced = enhance(&img)?;

    let mut buf = Vec::new();
    enhanced
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(PreprocessError::Encode)?;
    debug!("Preprocessed image → {} bytes PNG", buf.len());
    Ok(buf)
}

/// Scale and contrast-normalise a decoded image.
pub fn enhance(img: &DynamicImage) -> Result<GrayImage, PreprocessError> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(PreprocessError::EmptyImage);
    }

    let scale = scale_factor(width, height);
    let (new_w, new_h) = scaled_dimensions(width, height, scale);
    debug!(
        "Scaling {}x{} by {:.2} → {}x{}",
        width, height, scale, new_w, new_h
    );

    let rgb = img.resize_exact(new_w, new_h, FilterType::Triangle).to_rgb8();

    let mut out = GrayImage::new(new_w, new_h);
    for (x, y, px) in rgb.enumerate_pixels() {
        let [r, g, b] = px.0;
        out.put_pixel(x, y, Luma([contrast_stretch(r, g, b)]));
    }
    Ok(out)
}

/// `clamp(1200 / min(width, height), 1.5, 2.5)`.
pub fn scale_factor(width: u32, height: u32) -> f64 {
    let short = f64::from(width.min(height).max(1));
    (TARGET_SHORT_SIDE / short).clamp(MIN_SCALE, MAX_SCALE)
}

/// `(round(width * s), round(height * s))`, at least 1 px each.
pub fn scaled_dimensions(width: u32, height: u32, scale: f64) -> (u32, u32) {
    let w = (f64::from(width) * scale).round().max(1.0) as u32;
    let h = (f64::from(height) * scale).round().max(1.0) as u32;
    (w, h)
}

/// Luma of one RGB pixel, stretched around the midpoint.
pub fn contrast_stretch(r: u8, g: u8, b: u8) -> u8 {
    let luma = 0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b);
    let v = (luma - CONTRAST_MIDPOINT) * CONTRAST_GAIN + CONTRAST_MIDPOINT;
    v.clamp(0.0, 255.0).round() as u8
}
