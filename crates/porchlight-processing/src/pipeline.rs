//! Photo pipeline orchestration
//!
//! Runs decode → geometry map → composite → encode as one cancellable
//! sequence. Each stage is a suspension point; the cancellation token is
//! checked at every boundary so a caller that goes away mid-pipeline
//! releases surfaces deterministically instead of finishing work nobody
//! will read.
//!
//! Pipeline instances share no mutable state; concurrent uploads each run
//! their own invocation.

use crate::compositor::{Compositor, OutputSpec};
use crate::decoder::ImageDecoder;
use crate::geometry::{CropRegion, DisplayRect, GeometryMapper};
use crate::encoder::Encoder;
use crate::surface::{PixelSource, Surface};
use bytes::Bytes;
use porchlight_core::AppError;
use tokio_util::sync::CancellationToken;

/// Terminal output of the media pipeline; ownership passes to the caller.
#[derive(Debug, Clone)]
pub struct RenderedAsset {
    pub data: Bytes,
    pub content_type: &'static str,
}

/// Primary rendition plus its thumbnail variant.
#[derive(Debug, Clone)]
pub struct ProcessedPhoto {
    pub primary: RenderedAsset,
    pub thumbnail: RenderedAsset,
    /// Dimensions of the decoded, oriented, bounded source surface.
    pub source_width: u32,
    pub source_height: u32,
}

pub struct PhotoPipeline {
    decoder_max_dimension: u32,
    thumbnail_dimension: u32,
}

impl PhotoPipeline {
    pub fn new(decoder_max_dimension: u32, thumbnail_dimension: u32) -> Self {
        Self {
            decoder_max_dimension,
            thumbnail_dimension,
        }
    }

    /// Run the full pipeline. `crop` is expressed in the coordinates of the
    /// displayed element (`displayed` = its on-screen size); the decoded
    /// surface is the natural space the crop is mapped into.
    pub async fn run(
        &self,
        data: Vec<u8>,
        crop: DisplayRect,
        displayed: (f64, f64),
        spec: &OutputSpec,
        cancel: &CancellationToken,
    ) -> Result<ProcessedPhoto, AppError> {
        let source = self.decode(data, cancel).await?;
        let (source_width, source_height) = source.dimensions();

        let region =
            GeometryMapper::to_source_space(crop, (source_width, source_height), displayed)?;

        let output = self.compose(source.into(), region, spec.clone(), cancel).await?;

        // Thumbnail: centered square of the primary rendition, scaled to
        // the thumbnail bound, same format and quality.
        let thumb_spec = OutputSpec {
            width: self.thumbnail_dimension,
            height: self.thumbnail_dimension,
            ..spec.clone()
        };
        let thumb_region = centered_square(output.width(), output.height());
        let thumb_source: PixelSource = output.clone().into();
        let thumbnail = self
            .compose(thumb_source, thumb_region, thumb_spec.clone(), cancel)
            .await?;

        let content_type = spec.format.to_mime_type();
        let primary_data = self.encode(output, spec, cancel).await?;
        let thumbnail_data = self.encode(thumbnail, &thumb_spec, cancel).await?;

        Ok(ProcessedPhoto {
            primary: RenderedAsset {
                data: primary_data,
                content_type,
            },
            thumbnail: RenderedAsset {
                data: thumbnail_data,
                content_type,
            },
            source_width,
            source_height,
        })
    }

    async fn decode(
        &self,
        data: Vec<u8>,
        cancel: &CancellationToken,
    ) -> Result<Surface, AppError> {
        check_cancelled(cancel)?;
        let decoder = ImageDecoder::new(self.decoder_max_dimension);
        tokio::task::spawn_blocking(move || decoder.decode(&data))
            .await
            .map_err(|e| AppError::Internal(format!("decode task failed: {}", e)))?
    }

    async fn compose(
        &self,
        source: PixelSource,
        region: CropRegion,
        spec: OutputSpec,
        cancel: &CancellationToken,
    ) -> Result<Surface, AppError> {
        check_cancelled(cancel)?;
        tokio::task::spawn_blocking(move || Compositor::compose(&source, region, &spec))
            .await
            .map_err(|e| AppError::Internal(format!("compose task failed: {}", e)))?
    }

    async fn encode(
        &self,
        surface: Surface,
        spec: &OutputSpec,
        cancel: &CancellationToken,
    ) -> Result<Bytes, AppError> {
        check_cancelled(cancel)?;
        Encoder::encode(surface, spec).await
    }
}

fn check_cancelled(cancel: &CancellationToken) -> Result<(), AppError> {
    if cancel.is_cancelled() {
        tracing::debug!("Pipeline cancelled, releasing surfaces");
        return Err(AppError::Cancelled);
    }
    Ok(())
}

/// Largest centered square within `width` x `height`.
fn centered_square(width: u32, height: u32) -> CropRegion {
    let side = width.min(height);
    CropRegion {
        x: (width - side) / 2,
        y: (height - side) / 2,
        width: side,
        height: side,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::OutputFormat;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([90, 120, 150, 255]));
        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);
        img.write_to(&mut cursor, ImageFormat::Png).unwrap();
        buffer
    }

    fn spec() -> OutputSpec {
        OutputSpec::new(128, 128, OutputFormat::Jpeg, 0.85, "#fff").unwrap()
    }

    #[tokio::test]
    async fn test_end_to_end() {
        let pipeline = PhotoPipeline::new(2000, 32);
        let photo = pipeline
            .run(
                png_bytes(800, 600),
                DisplayRect {
                    x: 0.0,
                    y: 0.0,
                    width: 100.0,
                    height: 100.0,
                },
                (200.0, 150.0),
                &spec(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(photo.source_width, 800);
        assert_eq!(photo.source_height, 600);
        assert!(!photo.primary.data.is_empty());
        assert!(!photo.thumbnail.data.is_empty());
        assert_eq!(photo.primary.content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_cancellation_short_circuits() {
        let pipeline = PhotoPipeline::new(2000, 32);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = pipeline
            .run(
                png_bytes(100, 100),
                DisplayRect {
                    x: 0.0,
                    y: 0.0,
                    width: 10.0,
                    height: 10.0,
                },
                (100.0, 100.0),
                &spec(),
                &cancel,
            )
            .await;
        assert!(matches!(result, Err(AppError::Cancelled)));
    }

    #[tokio::test]
    async fn test_degenerate_display_dims_rejected() {
        let pipeline = PhotoPipeline::new(2000, 32);
        let result = pipeline
            .run(
                png_bytes(100, 100),
                DisplayRect {
                    x: 0.0,
                    y: 0.0,
                    width: 10.0,
                    height: 10.0,
                },
                (0.0, 100.0),
                &spec(),
                &CancellationToken::new(),
            )
            .await;
        assert!(matches!(result, Err(AppError::Geometry(_))));
    }

    #[test]
    fn test_centered_square() {
        assert_eq!(
            centered_square(100, 60),
            CropRegion {
                x: 20,
                y: 0,
                width: 60,
                height: 60
            }
        );
        assert_eq!(
            centered_square(60, 100),
            CropRegion {
                x: 0,
                y: 20,
                width: 60,
                height: 60
            }
        );
    }
}
