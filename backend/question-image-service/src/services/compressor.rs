//! Image compressor - shrinks question images under a byte ceiling
//!
//! Decodes the upload once, then re-encodes it as PNG on a descending quality
//! schedule (95, 90, ... 5) until the output fits the ceiling. When the floor is
//! reached the last encoding is returned even if it is still too large.
//!
//! PNG is lossless, so a "quality" knob alone does not change the output size.
//! `CompressionStrategy::Downscale` maps each quality step to a resolution scale
//! so the loop actually converges; `CompressionStrategy::Reencode` keeps the
//! plain re-encode behaviour for parity with the legacy uploader.
//!
//! Uses `spawn_blocking` for the CPU-heavy loop to avoid blocking the async runtime.

use bytes::Bytes;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, GenericImageView, ImageEncoder, ImageOutputFormat};
use serde::Deserialize;
use std::io::Cursor;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Default ceiling for stored images (200 KiB)
pub const DEFAULT_MAX_SIZE_BYTES: usize = 200 * 1024;

pub const START_QUALITY: u8 = 95;
pub const QUALITY_STEP: u8 = 5;
pub const MIN_QUALITY: u8 = 5;

/// Upper bound on encode passes: (95 - 5) / 5 + 1
pub const MAX_ITERATIONS: u32 = ((START_QUALITY - MIN_QUALITY) / QUALITY_STEP) as u32 + 1;

#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("cannot identify image file: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode PNG: {0}")]
    Encode(#[source] image::ImageError),

    #[error("compression task failed: {0}")]
    TaskFailed(String),
}

/// How each quality step is turned into PNG bytes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionStrategy {
    /// Resize to `quality / 95` of the original dimensions, best PNG compression
    #[default]
    Downscale,
    /// Re-encode the full raster every pass; quality has no effect on PNG output
    Reencode,
}

impl FromStr for CompressionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "downscale" => Ok(Self::Downscale),
            "reencode" => Ok(Self::Reencode),
            other => Err(format!("unknown compression strategy: {other}")),
        }
    }
}

/// Result of a compression run
#[derive(Debug, Clone)]
pub struct CompressionOutcome {
    /// Encoded PNG bytes from the last pass
    pub data: Bytes,
    /// Width of the encoded raster
    pub width: u32,
    /// Height of the encoded raster
    pub height: u32,
    /// Quality step that produced `data`
    pub quality: u8,
    /// Number of encode passes performed
    pub iterations: u32,
}

impl CompressionOutcome {
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Image compressor
#[derive(Debug, Clone, Default)]
pub struct Compressor {
    strategy: CompressionStrategy,
}

impl Compressor {
    pub fn new(strategy: CompressionStrategy) -> Self {
        Self { strategy }
    }

    /// Compress `data` until it fits `max_size_bytes` (blocking version)
    ///
    /// **Note:** This method is CPU-intensive and should not be called directly
    /// from async code. Use `compress_async` instead.
    pub fn compress(&self, data: &[u8], max_size_bytes: usize) -> Result<CompressionOutcome, CompressionError> {
        let img = image::load_from_memory(data).map_err(CompressionError::Decode)?;
        let img = normalize_color(img);

        let (orig_w, orig_h) = img.dimensions();
        debug!(
            original_width = orig_w,
            original_height = orig_h,
            original_size = data.len(),
            max_size_bytes,
            strategy = ?self.strategy,
            "Compressing image"
        );

        let mut quality = START_QUALITY;
        let mut iterations = 0u32;

        loop {
            iterations += 1;
            let (encoded, width, height) = self.encode_pass(&img, quality)?;

            debug!(quality, iterations, size = encoded.len(), "Compression pass");

            if encoded.len() <= max_size_bytes || quality <= MIN_QUALITY {
                return Ok(CompressionOutcome {
                    data: encoded,
                    width,
                    height,
                    quality,
                    iterations,
                });
            }

            quality -= QUALITY_STEP;
        }
    }

    /// Compress on the blocking thread pool
    pub async fn compress_async(
        self: Arc<Self>,
        data: Bytes,
        max_size_bytes: usize,
    ) -> Result<CompressionOutcome, CompressionError> {
        tokio::task::spawn_blocking(move || self.compress(&data, max_size_bytes))
            .await
            .map_err(|e| CompressionError::TaskFailed(e.to_string()))?
    }

    fn encode_pass(&self, img: &DynamicImage, quality: u8) -> Result<(Bytes, u32, u32), CompressionError> {
        match self.strategy {
            CompressionStrategy::Reencode => {
                let (w, h) = img.dimensions();
                Ok((encode_png_default(img)?, w, h))
            }
            CompressionStrategy::Downscale => {
                let (orig_w, orig_h) = img.dimensions();
                let (w, h) = scaled_dimensions(orig_w, orig_h, quality);

                if (w, h) == (orig_w, orig_h) {
                    return Ok((encode_png_best(img)?, w, h));
                }

                let resized = img.resize_exact(w, h, FilterType::Triangle);
                Ok((encode_png_best(&resized)?, w, h))
            }
        }
    }
}

/// Dimensions for a quality step: `quality / START_QUALITY` of the original, at least 1px
pub fn scaled_dimensions(width: u32, height: u32, quality: u8) -> (u32, u32) {
    if quality >= START_QUALITY {
        return (width, height);
    }

    let ratio = quality as f32 / START_QUALITY as f32;
    (
        ((width as f32) * ratio).round().max(1.0) as u32,
        ((height as f32) * ratio).round().max(1.0) as u32,
    )
}

// PNG encoder only accepts 8-bit layouts reliably across platforms
fn normalize_color(img: DynamicImage) -> DynamicImage {
    match img.color() {
        ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8 => img,
        _ => DynamicImage::ImageRgba8(img.to_rgba8()),
    }
}

fn encode_png_default(img: &DynamicImage) -> Result<Bytes, CompressionError> {
    let mut buf = Vec::new();
    let mut cursor = Cursor::new(&mut buf);

    img.write_to(&mut cursor, ImageOutputFormat::Png)
        .map_err(CompressionError::Encode)?;

    Ok(Bytes::from(buf))
}

fn encode_png_best(img: &DynamicImage) -> Result<Bytes, CompressionError> {
    let mut buf = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut buf, CompressionType::Best, PngFilterType::Adaptive);

    encoder
        .write_image(img.as_bytes(), img.width(), img.height(), img.color())
        .map_err(CompressionError::Encode)?;

    Ok(Bytes::from(buf))
}


#[cfg(test)]
mod tests {
    use super::test_images::{noise_png, solid_png};
    use super::*;

    #[test]
    fn test_max_iterations_bound() {
        assert_eq!(MAX_ITERATIONS, 19);
    }

    #[test]
    fn test_scaled_dimensions() {
        assert_eq!(scaled_dimensions(1900, 950, 95), (1900, 950));
        assert_eq!(scaled_dimensions(1900, 950, 50), (1000, 500));
        assert_eq!(scaled_dimensions(1900, 950, 5), (100, 50));
        assert_eq!(scaled_dimensions(3, 3, 5), (1, 1));
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("Downscale".parse::<CompressionStrategy>(), Ok(CompressionStrategy::Downscale));
        assert_eq!(" reencode ".parse::<CompressionStrategy>(), Ok(CompressionStrategy::Reencode));
        assert!("jpeg".parse::<CompressionStrategy>().is_err());
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let err = Compressor::default()
            .compress(b"definitely not an image", DEFAULT_MAX_SIZE_BYTES)
            .unwrap_err();
        assert!(matches!(err, CompressionError::Decode(_)));
    }

    #[test]
    fn test_small_image_fits_on_first_pass() {
        let outcome = Compressor::default()
            .compress(&solid_png(64, 64), DEFAULT_MAX_SIZE_BYTES)
            .unwrap();

        assert_eq!(outcome.iterations, 1);
        assert_eq!(outcome.quality, START_QUALITY);
        assert_eq!((outcome.width, outcome.height), (64, 64));
        assert!(image::load_from_memory(&outcome.data).is_ok());
    }

    #[test]
    fn test_downscale_reaches_ceiling() {
        let original = noise_png(500, 500, 7);
        assert!(original.len() > DEFAULT_MAX_SIZE_BYTES);

        let outcome = Compressor::new(CompressionStrategy::Downscale)
            .compress(&original, DEFAULT_MAX_SIZE_BYTES)
            .unwrap();

        assert!(outcome.size() <= DEFAULT_MAX_SIZE_BYTES);
        assert!(outcome.iterations > 1);
        assert!(outcome.iterations <= MAX_ITERATIONS);
        assert!(outcome.width < 500);

        let decoded = image::load_from_memory(&outcome.data).unwrap();
        assert_eq!(decoded.dimensions(), (outcome.width, outcome.height));
    }

    #[test]
    fn test_reencode_stops_at_quality_floor() {
        let original = noise_png(320, 320, 11);
        assert!(original.len() > 200_000);

        // Noise does not shrink under lossless re-encoding, so every step runs
        let outcome = Compressor::new(CompressionStrategy::Reencode)
            .compress(&original, 200_000)
            .unwrap();

        assert_eq!(outcome.iterations, MAX_ITERATIONS);
        assert_eq!(outcome.quality, MIN_QUALITY);
        assert!(outcome.size() > 200_000);
        assert_eq!((outcome.width, outcome.height), (320, 320));
    }

    #[test]
    fn test_impossible_ceiling_returns_last_pass() {
        let outcome = Compressor::default()
            .compress(&noise_png(200, 200, 3), 1)
            .unwrap();

        assert_eq!(outcome.iterations, MAX_ITERATIONS);
        assert_eq!(outcome.quality, MIN_QUALITY);
        assert!(outcome.size() > 1);
    }

    #[tokio::test]
    async fn test_compress_async_runs_on_blocking_pool() {
        let compressor = Arc::new(Compressor::default());
        let outcome = compressor
            .compress_async(Bytes::from(solid_png(32, 32)), DEFAULT_MAX_SIZE_BYTES)
            .await
            .unwrap();
        assert_eq!(outcome.iterations, 1);
    }

    #[tokio::test]
    async fn test_compress_async_releases_shared_compressor() {
        let shared = Arc::new(Compressor::default());
        shared
            .clone()
            .compress_async(Bytes::from(solid_png(16, 16)), DEFAULT_MAX_SIZE_BYTES)
            .await
            .unwrap();
        assert_eq!(Arc::strong_count(&shared), 1);
    }
}
