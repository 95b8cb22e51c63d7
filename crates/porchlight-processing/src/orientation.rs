//! Image orientation operations (EXIF read, rotation and flipping)

use image::{imageops, DynamicImage};
use porchlight_core::AppError;

pub struct ImageOrientation;

impl ImageOrientation {
    /// Read the EXIF orientation tag from raw image bytes.
    ///
    /// Returns 1 (normal) when the image carries no EXIF data; errors only
    /// when the metadata container itself is malformed.
    pub fn read_orientation(data: &[u8]) -> Result<u8, AppError> {
        let mut cursor = std::io::Cursor::new(data);
        match exif::Reader::new().read_from_container(&mut cursor) {
            Ok(meta) => Ok(meta
                .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
                .and_then(|field| field.value.get_uint(0))
                .map(|v| v as u8)
                .unwrap_or(1)),
            Err(exif::Error::NotFound(_)) => Ok(1),
            Err(e) => Err(AppError::Decode(format!("EXIF parse failed: {}", e))),
        }
    }

    /// Get rotation and flip operations needed for a given EXIF orientation
    /// Returns (rotate_angle, flip_horizontal, flip_vertical)
    pub fn orientation_transforms(orientation: u8) -> (Option<u16>, bool, bool) {
        match orientation {
            1 => (None, false, false),      // Normal
            2 => (None, true, false),       // Mirror horizontal
            3 => (Some(180), false, false), // Rotate 180
            4 => (None, false, true),       // Mirror vertical
            5 => (Some(270), true, false),  // Mirror horizontal + Rotate 270 CW
            6 => (Some(90), false, false),  // Rotate 90 CW
            7 => (Some(90), true, false),   // Mirror horizontal + Rotate 90 CW
            8 => (Some(270), false, false), // Rotate 270 CW
            _ => (None, false, false),      // Invalid, treat as normal
        }
    }

    /// Apply the transforms for `orientation` so the pixels match the
    /// intended display orientation.
    pub fn apply(mut img: DynamicImage, orientation: u8) -> DynamicImage {
        let (rotate, flip_h, flip_v) = Self::orientation_transforms(orientation);

        tracing::debug!(
            orientation = orientation,
            rotate = ?rotate,
            flip_horizontal = flip_h,
            flip_vertical = flip_v,
            "Applying EXIF orientation"
        );

        if let Some(angle) = rotate {
            img = Self::rotate_by_angle(img, angle);
        }
        if flip_h {
            img = DynamicImage::ImageRgba8(imageops::flip_horizontal(&img.to_rgba8()));
        }
        if flip_v {
            img = DynamicImage::ImageRgba8(imageops::flip_vertical(&img.to_rgba8()));
        }

        img
    }

    /// Rotate image by specified angle (90, 180, or 270 degrees clockwise)
    fn rotate_by_angle(img: DynamicImage, angle: u16) -> DynamicImage {
        match angle {
            90 => DynamicImage::ImageRgba8(imageops::rotate90(&img.to_rgba8())),
            180 => DynamicImage::ImageRgba8(imageops::rotate180(&img.to_rgba8())),
            270 => DynamicImage::ImageRgba8(imageops::rotate270(&img.to_rgba8())),
            _ => img,
        }
    }
}
