//! Asset encoding
//!
//! Turns a composited surface into a compressed binary asset. Encoding is
//! CPU-bound and runs off the async pool. An encoder that yields no bytes
//! is an error, never a zero-length asset.

use crate::compositor::{OutputFormat, OutputSpec};
use crate::surface::Surface;
use bytes::Bytes;
use image::DynamicImage;
use porchlight_core::AppError;
use std::io::Cursor;

pub struct Encoder;

impl Encoder {
    /// Encode `surface` per the spec's format and quality. Consumes the
    /// surface so its pixels are released as soon as the encode finishes.
    pub async fn encode(surface: Surface, spec: &OutputSpec) -> Result<Bytes, AppError> {
        let format = spec.format;
        let quality = spec.quality;
        let data = tokio::task::spawn_blocking(move || -> Result<Bytes, AppError> {
            match format {
                OutputFormat::Jpeg => Self::encode_jpeg(&surface, quality),
                OutputFormat::WebP => Self::encode_webp(&surface, quality),
                OutputFormat::Png => Self::encode_png(&surface),
            }
        })
        .await
        .map_err(|e| AppError::Internal(format!("encode task failed: {}", e)))??;

        if data.is_empty() {
            return Err(AppError::Surface("empty encode".to_string()));
        }
        Ok(data)
    }

    fn encode_jpeg(surface: &Surface, quality: f32) -> Result<Bytes, AppError> {
        let rgb = DynamicImage::ImageRgba8(surface.as_rgba().clone()).to_rgb8();
        let (width, height) = rgb.dimensions();

        let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
        comp.set_size(width as usize, height as usize);
        comp.set_quality(quality.clamp(0.0, 1.0) * 100.0);
        comp.set_progressive_mode();
        comp.set_optimize_coding(true);

        let mut comp = comp
            .start_compress(Vec::new())
            .map_err(|e| AppError::Surface(format!("jpeg encoder start failed: {}", e)))?;
        comp.write_scanlines(&rgb)
            .map_err(|e| AppError::Surface(format!("jpeg scanline write failed: {}", e)))?;
        let jpeg_data = comp
            .finish()
            .map_err(|e| AppError::Surface(format!("jpeg encode failed: {}", e)))?;

        Ok(Bytes::from(jpeg_data))
    }

    fn encode_webp(surface: &Surface, quality: f32) -> Result<Bytes, AppError> {
        let rgba = surface.as_rgba();
        let (width, height) = rgba.dimensions();
        let encoder = webp::Encoder::from_rgba(rgba, width, height);
        let webp_data = encoder.encode(quality.clamp(0.0, 1.0) * 100.0);
        Ok(Bytes::copy_from_slice(&webp_data))
    }

    fn encode_png(surface: &Surface) -> Result<Bytes, AppError> {
        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);
        surface
            .as_rgba()
            .write_to(&mut cursor, image::ImageFormat::Png)
            .map_err(|e| AppError::Surface(format!("png encode failed: {}", e)))?;
        Ok(Bytes::from(buffer))
    }
}
