//! Image decoding with orientation correction and a dimension bound
//!
//! Decoding tries an explicit ordered list of strategies. The primary
//! strategy corrects pixel orientation from EXIF metadata; the fallback
//! decodes without touching metadata, so a malformed EXIF segment degrades
//! to an unoriented decode instead of failing the upload. Corrupt pixel
//! data fails every strategy and aborts with a decode error.

use crate::orientation::ImageOrientation;
use crate::surface::Surface;
use image::{DynamicImage, GenericImageView};
use porchlight_core::AppError;
use std::io::Cursor;

/// Named decode strategies, tried in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeStrategy {
    /// Decode and apply EXIF orientation correction.
    ExifOriented,
    /// Decode only; orientation metadata is ignored (degraded mode).
    Plain,
}

impl DecodeStrategy {
    fn name(self) -> &'static str {
        match self {
            DecodeStrategy::ExifOriented => "exif_oriented",
            DecodeStrategy::Plain => "plain",
        }
    }

    fn decode(self, data: &[u8]) -> Result<DynamicImage, AppError> {
        let img = decode_bytes(data)?;
        match self {
            DecodeStrategy::ExifOriented => {
                let orientation = ImageOrientation::read_orientation(data)?;
                Ok(ImageOrientation::apply(img, orientation))
            }
            DecodeStrategy::Plain => Ok(img),
        }
    }
}

const STRATEGIES: &[DecodeStrategy] = &[DecodeStrategy::ExifOriented, DecodeStrategy::Plain];

fn decode_bytes(data: &[u8]) -> Result<DynamicImage, AppError> {
    let reader = image::ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| AppError::Decode(format!("unreadable image bytes: {}", e)))?;
    reader
        .decode()
        .map_err(|e| AppError::Decode(format!("decode failed: {}", e)))
}

/// Raw file bytes in, oriented and bounded surface out.
pub struct ImageDecoder {
    max_dimension: u32,
}

impl ImageDecoder {
    pub const DEFAULT_MAX_DIMENSION: u32 = 2000;

    pub fn new(max_dimension: u32) -> Self {
        Self { max_dimension }
    }

    /// Decode `data`, correct orientation, and downscale so neither
    /// dimension exceeds the bound. Never upscales.
    pub fn decode(&self, data: &[u8]) -> Result<Surface, AppError> {
        let mut last_err = None;
        for strategy in STRATEGIES {
            match strategy.decode(data) {
                Ok(img) => {
                    if *strategy != DecodeStrategy::ExifOriented {
                        tracing::warn!(
                            strategy = strategy.name(),
                            "Decoded without orientation correction (degraded mode)"
                        );
                    }
                    return Ok(self.bound(img));
                }
                Err(e) => {
                    tracing::debug!(
                        strategy = strategy.name(),
                        error = %e,
                        "Decode strategy failed"
                    );
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| AppError::Decode("no decode strategy ran".to_string())))
    }

    /// Scale down (never up) so both dimensions fit within the bound,
    /// preserving aspect ratio.
    fn bound(&self, img: DynamicImage) -> Surface {
        let (width, height) = img.dimensions();
        let max = self.max_dimension as f64;
        let scale = (max / width as f64).min(max / height as f64).min(1.0);

        if scale >= 1.0 {
            return Surface::from_image(img);
        }

        let new_width = ((width as f64 * scale).round() as u32).max(1);
        let new_height = ((height as f64 * scale).round() as u32).max(1);
        let filter = select_filter(width, height, new_width, new_height);
        Surface::from_image(img.resize_exact(new_width, new_height, filter))
    }
}

impl Default for ImageDecoder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_DIMENSION)
    }
}

/// Select the resampling filter by downscale ratio: cheap filters for heavy
/// reductions where ringing is invisible, Lanczos for near-1:1 work.
pub(crate) fn select_filter(
    orig_width: u32,
    orig_height: u32,
    new_width: u32,
    new_height: u32,
) -> image::imageops::FilterType {
    let width_ratio = orig_width as f32 / new_width as f32;
    let height_ratio = orig_height as f32 / new_height as f32;
    let max_ratio = width_ratio.max(height_ratio);

    if max_ratio > 2.0 {
        image::imageops::FilterType::Triangle
    } else if max_ratio > 1.5 {
        image::imageops::FilterType::CatmullRom
    } else {
        image::imageops::FilterType::Lanczos3
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 100, 50, 255]));
        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);
        img.write_to(&mut cursor, ImageFormat::Png).unwrap();
        buffer
    }

    #[test]
    fn test_downscale_to_bound() {
        let decoder = ImageDecoder::new(2000);
        let surface = decoder.decode(&png_bytes(4000, 3000)).unwrap();
        assert_eq!(surface.dimensions(), (2000, 1500));
    }

    #[test]
    fn test_no_upscaling() {
        let decoder = ImageDecoder::new(2000);
        let surface = decoder.decode(&png_bytes(800, 600)).unwrap();
        assert_eq!(surface.dimensions(), (800, 600));
    }

    #[test]
    fn test_bound_on_tall_image() {
        let decoder = ImageDecoder::new(100);
        let surface = decoder.decode(&png_bytes(50, 400)).unwrap();
        // scale = 100/400; width rounds to 13
        assert_eq!(surface.dimensions(), (13, 100));
    }

    #[test]
    fn test_corrupt_bytes_abort() {
        let decoder = ImageDecoder::default();
        let result = decoder.decode(b"definitely not an image");
        assert!(matches!(result, Err(AppError::Decode(_))));
    }

    #[test]
    fn test_empty_input_aborts() {
        let decoder = ImageDecoder::default();
        assert!(matches!(decoder.decode(&[]), Err(AppError::Decode(_))));
    }
}
