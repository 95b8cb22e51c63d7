//! Drawing surfaces
//!
//! `Surface` is the in-memory RGBA raster that flows between pipeline
//! stages. `PixelSource` is the tagged union of inputs the compositor can
//! draw from; every variant exposes the same capability: a drawable region
//! with known width and height.

use image::{DynamicImage, Rgba, RgbaImage};
use std::borrow::Cow;

/// An in-memory decoded image. Owned transiently by one pipeline
/// invocation; never shared between concurrent uploads.
#[derive(Clone)]
pub struct Surface {
    inner: RgbaImage,
}

impl Surface {
    pub fn from_image(img: DynamicImage) -> Self {
        Self {
            inner: img.to_rgba8(),
        }
    }

    pub fn from_rgba(inner: RgbaImage) -> Self {
        Self { inner }
    }

    /// Allocate a surface filled with a single color.
    pub fn filled(width: u32, height: u32, color: Rgba<u8>) -> Self {
        Self {
            inner: RgbaImage::from_pixel(width, height, color),
        }
    }

    pub fn width(&self) -> u32 {
        self.inner.width()
    }

    pub fn height(&self) -> u32 {
        self.inner.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.inner.dimensions()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.inner
    }

    pub fn as_rgba_mut(&mut self) -> &mut RgbaImage {
        &mut self.inner
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.inner
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

/// The union of acceptable compositor inputs. A freshly decoded image and
/// an already-composited surface are both just pixel rectangles here.
pub enum PixelSource {
    Decoded(DynamicImage),
    Surface(Surface),
}

impl PixelSource {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            PixelSource::Decoded(img) => {
                use image::GenericImageView;
                img.dimensions()
            }
            PixelSource::Surface(s) => s.dimensions(),
        }
    }

    /// RGBA pixel view. Borrows when the source already holds RGBA,
    /// converts otherwise.
    pub fn rgba(&self) -> Cow<'_, RgbaImage> {
        match self {
            PixelSource::Decoded(img) => Cow::Owned(img.to_rgba8()),
            PixelSource::Surface(s) => Cow::Borrowed(s.as_rgba()),
        }
    }
}

impl From<Surface> for PixelSource {
    fn from(s: Surface) -> Self {
        PixelSource::Surface(s)
    }
}

impl From<DynamicImage> for PixelSource {
    fn from(img: DynamicImage) -> Self {
        PixelSource::Decoded(img)
    }
}
