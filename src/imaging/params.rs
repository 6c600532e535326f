//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the compositor / pipeline (which decide what pixels are
//! needed) and the [`backend`](super::backend) (which does the pixel work).
//! This separation allows swapping backends (e.g. a recording mock in layout
//! tests) without changing the layout logic.
//!
//! ## Types
//!
//! - [`Rotation`]: Panel rotation, either none or a half turn.
//! - [`Resample`]: Resampling filter used for cover-fit and mask resizes.
//! - [`Compression`]: PNG compression effort.
//! - [`PanelParams`]: Source bytes + exact panel size + rotation.
//! - [`MaskParams`]: Mask bytes + the exact size of the page it will edit.

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rotation applied to a panel after resizing.
///
/// Only half turns occur on a single-sheet fold, so this is not a general angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    None,
    Half,
}

impl Rotation {
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::None => 0,
            Rotation::Half => 180,
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Resampling filter, as named in `config.toml`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resample {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

impl Resample {
    pub fn filter(self) -> FilterType {
        match self {
            Resample::Nearest => FilterType::Nearest,
            Resample::Triangle => FilterType::Triangle,
            Resample::CatmullRom => FilterType::CatmullRom,
            Resample::Gaussian => FilterType::Gaussian,
            Resample::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// PNG compression effort. Never affects pixels, only size and speed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Compression {
    Fast,
    #[default]
    Default,
    Best,
}

/// Render one print panel from a source page image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelParams<'a> {
    /// Encoded source image (any decodable format).
    pub source: &'a [u8],
    /// Exact panel size.
    pub width: u32,
    pub height: u32,
    pub rotation: Rotation,
    pub resample: Resample,
}

/// Prepare an inpainting mask for a page of known size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskParams<'a> {
    /// Encoded mask; white marks the region to repaint.
    pub source: &'a [u8],
    /// Exact size of the page the mask will be applied to.
    pub width: u32,
    pub height: u32,
}
