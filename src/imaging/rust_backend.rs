//! Pure Rust image processing backend on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `ImageReader::with_guessed_format` + `into_dimensions` (header only) |
//! | Decode (PNG, JPEG, WebP) | `image` crate (pure Rust decoders) |
//! | Cover-fit | `image::DynamicImage::resize_to_fill` (scale to fill, centered crop) |
//! | Rotation | `image::imageops::rotate180_in_place` |
//! | Mask fill-fit | `image::DynamicImage::resize_exact` + luma threshold |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::{Compression, MaskParams, PanelParams, Rotation};
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, GrayImage, ImageEncoder, ImageReader, Luma, RgbaImage};
use std::io::Cursor;

/// Mask pixels at or above this luma are editable (white); the rest are kept.
const MASK_THRESHOLD: u8 = 128;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode an in-memory image, sniffing the format from its magic bytes.
fn load_image(source: &[u8]) -> Result<DynamicImage, BackendError> {
    ImageReader::new(Cursor::new(source))
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| BackendError::Decode(e.to_string()))
}

fn compression_type(compression: Compression) -> CompressionType {
    match compression {
        Compression::Fast => CompressionType::Fast,
        Compression::Default => CompressionType::Default,
        Compression::Best => CompressionType::Best,
    }
}

/// Encode raw pixel data as PNG into a fresh buffer.
fn write_png(
    raw: &[u8],
    width: u32,
    height: u32,
    color: ExtendedColorType,
    compression: Compression,
) -> Result<Vec<u8>, BackendError> {
    let mut out = Vec::new();
    let encoder = PngEncoder::new_with_quality(
        &mut out,
        compression_type(compression),
        PngFilter::Adaptive,
    );
    encoder
        .write_image(raw, width, height, color)
        .map_err(|e| BackendError::Encode(e.to_string()))?;
    Ok(out)
}

fn check_target(width: u32, height: u32) -> Result<(), BackendError> {
    if width == 0 || height == 0 {
        return Err(BackendError::ProcessingFailed(format!(
            "target size {width}x{height} has no area"
        )));
    }
    Ok(())
}

impl ImageBackend for RustBackend {
    fn identify(&self, source: &[u8]) -> Result<Dimensions, BackendError> {
        let (width, height) = ImageReader::new(Cursor::new(source))
            .with_guessed_format()
            .map_err(BackendError::Io)?
            .into_dimensions()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(Dimensions { width, height })
    }

    fn panel(&self, params: &PanelParams) -> Result<RgbaImage, BackendError> {
        check_target(params.width, params.height)?;
        let img = load_image(params.source)?;

        // Fill-resize then center-crop to exact dimensions
        let mut panel = img
            .resize_to_fill(params.width, params.height, params.resample.filter())
            .into_rgba8();

        if params.rotation == Rotation::Half {
            image::imageops::rotate180_in_place(&mut panel);
        }

        if panel.dimensions() != (params.width, params.height) {
            return Err(BackendError::ProcessingFailed(format!(
                "cover-fit produced {}x{}, expected {}x{}",
                panel.width(),
                panel.height(),
                params.width,
                params.height
            )));
        }
        Ok(panel)
    }

    fn mask(&self, params: &MaskParams) -> Result<Vec<u8>, BackendError> {
        check_target(params.width, params.height)?;
        let resized = load_image(params.source)?
            .resize_exact(params.width, params.height, FilterType::Triangle)
            .into_luma8();

        let binary = GrayImage::from_fn(params.width, params.height, |x, y| {
            if resized.get_pixel(x, y).0[0] >= MASK_THRESHOLD {
                Luma([255])
            } else {
                Luma([0])
            }
        });

        write_png(
            binary.as_raw(),
            params.width,
            params.height,
            ExtendedColorType::L8,
            Compression::Default,
        )
    }

    fn encode_png(
        &self,
        image: &RgbaImage,
        compression: Compression,
    ) -> Result<Vec<u8>, BackendError> {
        write_png(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
            compression,
        )
    }
}
