//! Compositor: draw a source crop onto a fixed-size output surface
//!
//! The named source sub-rectangle is scaled to exactly fill the output
//! dimensions. No letterboxing and no aspect preservation: callers supply a
//! crop whose aspect matches the output if they care about distortion.
//! Formats without alpha get the output flattened onto the background color
//! first, otherwise transparent regions would encode as black.

use crate::decoder::select_filter;
use crate::geometry::CropRegion;
use crate::surface::{PixelSource, Surface};
use image::{imageops, DynamicImage, Rgba};
use porchlight_core::AppError;

/// Target encoding format for the media pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    WebP,
    Png,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s.to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "webp" => Ok(OutputFormat::WebP),
            "png" => Ok(OutputFormat::Png),
            other => Err(AppError::Validation(format!(
                "Unsupported output format: {}",
                other
            ))),
        }
    }

    pub fn to_mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::WebP => "image/webp",
            OutputFormat::Png => "image/png",
        }
    }

    /// File extension used when building storage keys.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::WebP => "webp",
            OutputFormat::Png => "png",
        }
    }

    pub fn supports_alpha(self) -> bool {
        !matches!(self, OutputFormat::Jpeg)
    }
}

/// Output surface specification: fixed dimensions, encoding format,
/// quality in [0,1] (ignored for png), and the flattening background.
#[derive(Debug, Clone)]
pub struct OutputSpec {
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub quality: f32,
    pub background_color: [u8; 3],
}

impl OutputSpec {
    pub fn new(
        width: u32,
        height: u32,
        format: OutputFormat,
        quality: f32,
        background_color: &str,
    ) -> Result<Self, AppError> {
        if width == 0 || height == 0 {
            return Err(AppError::Validation(format!(
                "Output dimensions must be positive (got {}x{})",
                width, height
            )));
        }
        Ok(Self {
            width,
            height,
            format,
            quality: quality.clamp(0.0, 1.0),
            background_color: parse_hex_color(background_color)?,
        })
    }
}

/// Parse `#rgb` or `#rrggbb` into RGB components.
pub fn parse_hex_color(s: &str) -> Result<[u8; 3], AppError> {
    let hex = s.trim().trim_start_matches('#');
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => {
            return Err(AppError::Validation(format!(
                "Invalid background color: {}",
                s
            )))
        }
    };
    let parse = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&expanded[range], 16)
            .map_err(|_| AppError::Validation(format!("Invalid background color: {}", s)))
    };
    Ok([parse(0..2)?, parse(2..4)?, parse(4..6)?])
}

pub struct Compositor;

impl Compositor {
    /// Draw `crop` from `source` scaled to exactly fill a new surface of
    /// the spec's dimensions. The source is read, never mutated.
    pub fn compose(
        source: &PixelSource,
        crop: CropRegion,
        spec: &OutputSpec,
    ) -> Result<Surface, AppError> {
        let (src_width, src_height) = source.dimensions();
        if crop.width == 0 || crop.height == 0 {
            return Err(AppError::Validation(format!(
                "Crop region must be non-empty (got {}x{})",
                crop.width, crop.height
            )));
        }
        if crop.x.saturating_add(crop.width) > src_width
            || crop.y.saturating_add(crop.height) > src_height
        {
            return Err(AppError::Validation(format!(
                "Crop region {}x{}+{}+{} exceeds source bounds {}x{}",
                crop.width, crop.height, crop.x, crop.y, src_width, src_height
            )));
        }

        let rgba = source.rgba();
        let cropped =
            imageops::crop_imm(rgba.as_ref(), crop.x, crop.y, crop.width, crop.height).to_image();

        let filter = select_filter(crop.width, crop.height, spec.width, spec.height);
        let scaled = DynamicImage::ImageRgba8(cropped)
            .resize_exact(spec.width, spec.height, filter)
            .to_rgba8();

        // Opaque targets are flattened: fill with the background color and
        // alpha-blend the scaled crop over it.
        let [r, g, b] = spec.background_color;
        let mut output = if spec.format.supports_alpha() {
            Surface::filled(spec.width, spec.height, Rgba([0, 0, 0, 0]))
        } else {
            Surface::filled(spec.width, spec.height, Rgba([r, g, b, 255]))
        };
        imageops::overlay(output.as_rgba_mut(), &scaled, 0, 0);

        Ok(output)
    }
}
