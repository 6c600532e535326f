//! Print-layout compositor: eight page images onto one fold-able sheet.
//!
//! A single US Letter sheet printed landscape at 300 DPI is 3300×2550 px. It
//! is divided into a 4×2 grid of 825×1275 panels, one per page. After the
//! standard mini-zine fold (fold in half twice, cut the center slit, fold into
//! a booklet) the panels read 1 to 8 in order, which dictates where each page
//! sits and that the whole top row is printed upside down:
//!
//! ```text
//! ┌──────┬──────┬──────┬──────┐
//! │  1   │  8   │  7   │  6   │   row 0, rotated 180°
//! │ (↻)  │ (↻)  │ (↻)  │ (↻)  │
//! ├──────┼──────┼──────┼──────┤
//! │  2   │  3   │  4   │  5   │   row 1, upright
//! └──────┴──────┴──────┴──────┘
//! ```
//!
//! The mapping follows the page *number* only. A page's editorial
//! [`PageType`](crate::types::PageType) never moves it: if an outline ever
//! puts its cover on page 3, page 3 still prints in the second bottom panel.
//!
//! ## Pipeline
//!
//! 1. Check that exactly 8 page buffers were supplied.
//! 2. Fan out over [`PAGE_ARRANGEMENT`] with rayon: each page is cover-fit to
//!    825×1275 and rotated if its panel requires it ([`render_panel`]).
//! 3. Fan in: overlay every panel at `(column × 825, row × 1275)` on a white
//!    canvas. The grid cells don't overlap, so order doesn't matter.
//! 4. Encode the canvas as PNG ([`create_print_layout`]).
//!
//! Any failure aborts the whole sheet; there is no partial output.

use crate::imaging::calculations::{
    calculate_center_crop, calculate_cover_scale, calculate_fill_dimensions,
};
use crate::imaging::{BackendError, Compression, ImageBackend, PanelParams, Resample, Rotation};
use crate::types::{PAGE_COUNT, PageNumber};
use image::{Rgba, RgbaImage};
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info};

/// Print resolution in dots per inch.
pub const PRINT_DPI: u32 = 300;
/// Sheet width: 11" at 300 DPI.
pub const PRINT_WIDTH: u32 = 3300;
/// Sheet height: 8.5" at 300 DPI.
pub const PRINT_HEIGHT: u32 = 2550;
/// Panel width: a quarter of the sheet.
pub const PANEL_WIDTH: u32 = 825;
/// Panel height: half of the sheet.
pub const PANEL_HEIGHT: u32 = 1275;

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Expected {PAGE_COUNT} pages, got {found}")]
    MissingPages { found: usize },
    #[error("Expected {PAGE_COUNT} pages, got {found} (too many)")]
    ExtraPages { found: usize },
    #[error("Page {page} is not a readable image: {reason}")]
    UnreadableImage { page: PageNumber, reason: String },
    #[error("Failed to encode print layout: {0}")]
    Encode(String),
}

/// Where one page lands on the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelPlacement {
    pub page: PageNumber,
    pub column: u32,
    pub row: u32,
    pub rotation: Rotation,
}

impl PanelPlacement {
    /// Top-left pixel of this panel on the sheet.
    pub fn offset(&self) -> (u32, u32) {
        (self.column * PANEL_WIDTH, self.row * PANEL_HEIGHT)
    }
}

const fn place(page: u8, column: u32, row: u32, rotation: Rotation) -> PanelPlacement {
    let page = match PageNumber::new(page) {
        Some(page) => page,
        None => panic!("arrangement entry outside 1..=8"),
    };
    PanelPlacement {
        page,
        column,
        row,
        rotation,
    }
}

/// Fold-order table, in sheet order (top row left to right, then bottom row).
pub const PAGE_ARRANGEMENT: [PanelPlacement; PAGE_COUNT] = [
    place(1, 0, 0, Rotation::Half),
    place(8, 1, 0, Rotation::Half),
    place(7, 2, 0, Rotation::Half),
    place(6, 3, 0, Rotation::Half),
    place(2, 0, 1, Rotation::None),
    place(3, 1, 1, Rotation::None),
    place(4, 2, 1, Rotation::None),
    place(5, 3, 1, Rotation::None),
];

/// Look up the panel for a page.
pub fn placement_for(page: PageNumber) -> PanelPlacement {
    PAGE_ARRANGEMENT
        .iter()
        .copied()
        .find(|p| p.page == page)
        .unwrap_or(PAGE_ARRANGEMENT[0])
}

/// Rendering knobs. Geometry is fixed; only quality/speed trade-offs vary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutOptions {
    pub filter: Resample,
    pub compression: Compression,
}

/// How a source of a given size is cover-fit into a panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverFit {
    /// Uniform scale applied to the source.
    pub scale: f64,
    /// Source size after scaling, before the crop.
    pub filled: (u32, u32),
    /// Top-left of the centered crop within `filled`.
    pub crop: (u32, u32),
}

impl CoverFit {
    /// Whether the source already has the panel's exact size.
    pub fn is_exact(&self) -> bool {
        self.scale == 1.0 && self.filled == (PANEL_WIDTH, PANEL_HEIGHT)
    }

    /// Whether part of the scaled source is cut off.
    pub fn crops(&self) -> bool {
        self.filled != (PANEL_WIDTH, PANEL_HEIGHT)
    }
}

/// Plan the cover-fit of a source image into a panel.
pub fn plan_cover_fit(source: (u32, u32)) -> CoverFit {
    let target = (PANEL_WIDTH, PANEL_HEIGHT);
    let filled = calculate_fill_dimensions(source, target);
    CoverFit {
        scale: calculate_cover_scale(source, target),
        filled,
        crop: calculate_center_crop(filled, target),
    }
}

/// Render one page into its panel: cover-fit to 825×1275, then rotate.
pub fn render_panel(
    backend: &impl ImageBackend,
    source: &[u8],
    placement: PanelPlacement,
    options: &LayoutOptions,
) -> Result<RgbaImage, LayoutError> {
    backend
        .panel(&PanelParams {
            source,
            width: PANEL_WIDTH,
            height: PANEL_HEIGHT,
            rotation: placement.rotation,
            resample: options.filter,
        })
        .map_err(|e| LayoutError::UnreadableImage {
            page: placement.page,
            reason: e.to_string(),
        })
}

fn check_page_count(found: usize) -> Result<(), LayoutError> {
    match found {
        n if n < PAGE_COUNT => Err(LayoutError::MissingPages { found: n }),
        n if n > PAGE_COUNT => Err(LayoutError::ExtraPages { found: n }),
        _ => Ok(()),
    }
}

/// Compose the print sheet in memory.
///
/// `pages[0]` is page 1, `pages[7]` is page 8.
pub fn compose_canvas<B: AsRef<[u8]> + Sync>(
    backend: &impl ImageBackend,
    pages: &[B],
    options: &LayoutOptions,
) -> Result<RgbaImage, LayoutError> {
    check_page_count(pages.len())?;

    let panels: Vec<(PanelPlacement, RgbaImage)> = PAGE_ARRANGEMENT
        .par_iter()
        .map(|&placement| {
            let source = pages[placement.page.index()].as_ref();
            let panel = render_panel(backend, source, placement, options)?;
            debug!(
                page = placement.page.get(),
                column = placement.column,
                row = placement.row,
                rotation = placement.rotation.degrees(),
                "rendered panel"
            );
            Ok((placement, panel))
        })
        .collect::<Result<_, LayoutError>>()?;

    let mut canvas = RgbaImage::from_pixel(PRINT_WIDTH, PRINT_HEIGHT, BACKGROUND);
    for (placement, panel) in &panels {
        let (x, y) = placement.offset();
        image::imageops::overlay(&mut canvas, panel, i64::from(x), i64::from(y));
    }
    Ok(canvas)
}

/// A finished print sheet.
#[derive(Debug, Clone)]
pub struct PrintLayout {
    /// PNG-encoded sheet.
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// SHA-256 of `png`, lowercase hex.
    pub digest: String,
}

/// Compose the print sheet and encode it as PNG.
pub fn create_print_layout<B: AsRef<[u8]> + Sync>(
    backend: &impl ImageBackend,
    pages: &[B],
    options: &LayoutOptions,
) -> Result<PrintLayout, LayoutError> {
    let canvas = compose_canvas(backend, pages, options)?;
    let png = backend
        .encode_png(&canvas, options.compression)
        .map_err(|e| match e {
            BackendError::Encode(msg) => LayoutError::Encode(msg),
            other => LayoutError::Encode(other.to_string()),
        })?;
    let digest = format!("{:x}", Sha256::digest(&png));
    info!(bytes = png.len(), %digest, "print layout encoded");
    Ok(PrintLayout {
        png,
        width: canvas.width(),
        height: canvas.height(),
        digest,
    })
}
