//! Crop geometry
//!
//! A crop rectangle selected on a displayed image element lives in display
//! coordinates; the pixels live in the image's native space. The mapper
//! converts between the two with independent x/y scale factors, so a
//! layout-squashed element still maps correctly.

use porchlight_core::AppError;

/// Crop rectangle in source pixel space: origin + dimensions.
///
/// Invariant: `x + width` and `y + height` must stay within the surface the
/// region is applied to; the compositor validates this before drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Crop rectangle in display coordinates (fractional pixels from layout).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

pub struct GeometryMapper;

impl GeometryMapper {
    /// Map a display-space rectangle to source pixel space.
    ///
    /// `natural` is the image's native pixel size, `displayed` the on-screen
    /// size of the element the rectangle was selected on. Scale factors are
    /// applied per axis; aspect-ratio mismatch between the two spaces is
    /// allowed and produces non-uniform scaling.
    pub fn to_source_space(
        rect: DisplayRect,
        natural: (u32, u32),
        displayed: (f64, f64),
    ) -> Result<CropRegion, AppError> {
        let (display_width, display_height) = displayed;
        if display_width <= 0.0 || display_height <= 0.0 {
            return Err(AppError::Geometry(format!(
                "Displayed dimensions must be positive (got {}x{})",
                display_width, display_height
            )));
        }

        let scale_x = natural.0 as f64 / display_width;
        let scale_y = natural.1 as f64 / display_height;

        Ok(CropRegion {
            x: (rect.x * scale_x).round().max(0.0) as u32,
            y: (rect.y * scale_y).round().max(0.0) as u32,
            width: (rect.width * scale_x).round().max(0.0) as u32,
            height: (rect.height * scale_y).round().max(0.0) as u32,
        })
    }
}
