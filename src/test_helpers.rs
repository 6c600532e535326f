//! Shared test utilities for the mycozine test suite.
//!
//! Provides in-memory image fixtures, a canonical 8-page outline, and a
//! store pre-populated with rendered pages.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let (tmp, store, zine_id) = store_with_pages(40, 60);
//! let zine = store.load_zine(&zine_id).unwrap();
//! assert_eq!(zine.rendered_count(), 8);
//!
//! let png = solid_png(10, 10, page_color(3));
//! ```

use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use tempfile::TempDir;

use crate::store::{FsStore, ZineStore};
use crate::types::{PageNumber, PageOutline, PageType, Style, Tone, Zine};

// =========================================================================
// Image fixtures
// =========================================================================

fn encode(img: &RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

/// Single-colour PNG.
pub fn solid_png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    encode(&RgbImage::from_pixel(width, height, Rgb(rgb)), ImageFormat::Png)
}

/// Single-colour JPEG, for sources that must be converted before storage.
pub fn solid_jpeg(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    encode(&RgbImage::from_pixel(width, height, Rgb(rgb)), ImageFormat::Jpeg)
}

/// PNG with red rising left→right and green rising top→bottom.
///
/// No two corners share a colour, so flips and half turns are detectable.
pub fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        Rgb([r, g, 96])
    });
    encode(&img, ImageFormat::Png)
}

/// Distinct colour for each page number.
pub fn page_color(page: u8) -> [u8; 3] {
    [page * 30, 255 - page * 25, 40 + page * 10]
}

/// Eight solid pages in reading order, each filled with [`page_color`].
pub fn solid_pages(width: u32, height: u32) -> Vec<Vec<u8>> {
    PageNumber::all()
        .map(|p| solid_png(width, height, page_color(p.get())))
        .collect()
}

// =========================================================================
// Outline fixtures
// =========================================================================

fn outline_page(
    number: u8,
    page_type: PageType,
    title: &str,
    key_points: &[&str],
    image_prompt: &str,
) -> PageOutline {
    PageOutline {
        page_number: PageNumber::new(number).unwrap(),
        page_type,
        title: title.to_string(),
        key_points: key_points.iter().map(|s| s.to_string()).collect(),
        image_prompt: image_prompt.to_string(),
    }
}

/// Canonical 8-page outline about mushrooms.
pub fn sample_outline() -> Vec<PageOutline> {
    vec![
        outline_page(
            1,
            PageType::Cover,
            "Spore Print",
            &["A field guide to the hidden kingdom", "Issue one"],
            "a giant mushroom cap seen from below with gills radiating outward",
        ),
        outline_page(
            2,
            PageType::Intro,
            "Look Down",
            &["Most of a fungus lives underground", "You walk over it every day"],
            "a cross-section of forest soil with white threads between the roots",
        ),
        outline_page(
            3,
            PageType::Content,
            "The Wood Wide Web",
            &["Trees swap sugar for minerals", "Old trees feed their seedlings"],
            "an intricate map of mycelial threads connecting the roots of an old oak to \
             young saplings, drawn like a subway diagram with stations at every root tip, \
             labels in hand lettering, glowing nodes where nutrients change hands, and a \
             cutaway showing the soil layers from leaf litter down to bedrock",
        ),
        outline_page(
            4,
            PageType::Content,
            "Decomposers",
            &["Fungi turn logs into soil", "Nothing is wasted"],
            "a fallen log slowly covered in bracket fungi, shown across four seasons",
        ),
        outline_page(
            5,
            PageType::Content,
            "Spore Season",
            &["One cap releases billions of spores", "Wind does the rest"],
            "a cloud of spores drifting out of a puffball into evening light",
        ),
        outline_page(
            6,
            PageType::Content,
            "Mushrooms in the City",
            &["Oyster mushrooms grow on coffee grounds"],
            "oyster mushrooms sprouting from a bucket on a fire escape",
        ),
        outline_page(
            7,
            PageType::Resources,
            "Go Further",
            &["Join a local mycological society", "Keep a spore print journal"],
            "a stack of field guides and a hand lens on a mossy stump",
        ),
        outline_page(
            8,
            PageType::CallToAction,
            "Grow Your Own",
            &["Start a jar of oyster spawn this week"],
            "hands holding a glass jar full of white mycelium",
        ),
    ]
}

/// [`sample_outline`] as a compact `{"pages": […]}` response body.
pub fn outline_json() -> String {
    serde_json::to_string(&serde_json::json!({ "pages": sample_outline() })).unwrap()
}

/// A fresh zine built from [`sample_outline`], not yet saved.
pub fn sample_zine() -> Zine {
    Zine::new(
        "mushrooms",
        Style::Mycelial,
        Tone::Regenerative,
        sample_outline(),
    )
    .unwrap()
}

// =========================================================================
// Store fixtures
// =========================================================================

/// Temp store holding one saved zine with all 8 pages rendered.
///
/// Page `n` is a `width`×`height` PNG filled with `page_color(n)`.
pub fn store_with_pages(width: u32, height: u32) -> (TempDir, FsStore, String) {
    let tmp = TempDir::new().unwrap();
    let store = FsStore::new(tmp.path());
    let mut zine = sample_zine();
    store.save_zine(&zine).unwrap();
    for page in PageNumber::all() {
        let png = solid_png(width, height, page_color(page.get()));
        let reference = store.save_page_image(&zine.id, page, &png).unwrap();
        zine.set_page_ref(page, reference);
    }
    store.save_zine(&zine).unwrap();
    let id = zine.id.clone();
    (tmp, store, id)
}
