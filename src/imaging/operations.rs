//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take plain inputs, compute parameters, and call the backend.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::{Compression, MaskParams, PanelParams, Resample, Rotation};
use image::ImageFormat;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, source: &[u8]) -> Result<(u32, u32)> {
    let dims = backend.identify(source)?;
    Ok((dims.width, dims.height))
}

/// Prepare an inpainting mask for a specific page image.
///
/// The mask is stretched to the page's exact pixel size (fill-fit, not
/// cover-fit: every mask pixel must land on the page) and binarized.
pub fn prepare_mask(backend: &impl ImageBackend, mask: &[u8], page: &[u8]) -> Result<Vec<u8>> {
    let Dimensions { width, height } = backend.identify(page)?;
    backend.mask(&MaskParams {
        source: mask,
        width,
        height,
    })
}

/// Return `source` as PNG bytes, re-encoding only when it isn't PNG already.
///
/// Pixels are carried over unchanged: the re-encode goes through a
/// nearest-neighbour "panel" at the image's own size.
pub fn ensure_png(backend: &impl ImageBackend, source: &[u8]) -> Result<Vec<u8>> {
    if matches!(image::guess_format(source), Ok(ImageFormat::Png)) {
        return Ok(source.to_vec());
    }
    let Dimensions { width, height } = backend.identify(source)?;
    let pixels = backend.panel(&PanelParams {
        source,
        width,
        height,
        rotation: Rotation::None,
        resample: Resample::Nearest,
    })?;
    backend.encode_png(&pixels, Compression::Default)
}
