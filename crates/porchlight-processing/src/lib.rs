//! Media normalization pipeline
//!
//! This crate turns untrusted user-submitted image bytes into bounded,
//! correctly oriented, cropped and re-encoded assets:
//! - Decoding with orientation correction and a dimension bound (decoder)
//! - Display-space to pixel-space crop mapping (geometry)
//! - Drawing the crop onto a fixed-size surface with flattening (compositor)
//! - Re-encoding to jpeg/webp/png (encoder)
//! - One cancellable end-to-end orchestration (pipeline)

pub mod compositor;
pub mod decoder;
pub mod encoder;
pub mod geometry;
pub mod orientation;
pub mod pipeline;
pub mod surface;
pub mod validator;

pub use compositor::{Compositor, OutputFormat, OutputSpec};
pub use decoder::ImageDecoder;
pub use encoder::Encoder;
pub use geometry::{CropRegion, DisplayRect, GeometryMapper};
pub use orientation::ImageOrientation;
pub use pipeline::{PhotoPipeline, ProcessedPhoto, RenderedAsset};
pub use surface::{PixelSource, Surface};
pub use validator::UploadValidator;
