//! Image processing: pure Rust, zero system dependencies.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `ImageReader::into_dimensions` |
//! | **Panel** | `resize_to_fill` (cover-fit) + `rotate180_in_place` |
//! | **Mask** | `resize_exact` (fill-fit) + luma threshold |
//! | **Encode** | `PngEncoder` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend
//! - **Placeholder**: styled stand-in pages drawn without any provider

pub mod backend;
pub mod calculations;
pub mod operations;
mod params;
pub mod placeholder;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use operations::{ensure_png, get_dimensions, prepare_mask};
pub use params::{Compression, MaskParams, PanelParams, Resample, Rotation};
pub use placeholder::render_placeholder;
pub use rust_backend::RustBackend;
