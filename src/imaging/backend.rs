//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the four operations every backend must
//! support: identify, panel, mask, and encode_png.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), pure Rust on top of the
//! `image` crate. Everything works on in-memory buffers; reading and writing
//! files is the store's job.

use super::params::{Compression, MaskParams, PanelParams};
use image::RgbaImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Not a decodable image: {0}")]
    Decode(String),
    #[error("Encoding failed: {0}")]
    Encode(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Trait for image processing backends.
///
/// Every backend must implement all four operations so the compositor and
/// pipeline are backend-agnostic. `Sync` is required because panels are
/// rendered from rayon worker threads.
pub trait ImageBackend: Sync {
    /// Get image dimensions without a full decode where possible.
    fn identify(&self, source: &[u8]) -> Result<Dimensions, BackendError>;

    /// Decode, cover-fit to the exact panel size, then rotate.
    fn panel(&self, params: &PanelParams) -> Result<RgbaImage, BackendError>;

    /// Resize a mask to the exact page size and binarize it; returns PNG bytes.
    fn mask(&self, params: &MaskParams) -> Result<Vec<u8>, BackendError>;

    /// Encode an RGBA canvas as PNG.
    fn encode_png(&self, image: &RgbaImage, compression: Compression)
    -> Result<Vec<u8>, BackendError>;
}
