//! Styled placeholder pages.
//!
//! When every image provider fails, a page still needs *something* printable
//! so the sheet can be assembled and proofed. The placeholder is drawn with
//! plain pixel operations: the style's paper color and texture, a double
//! frame, accent corners, a page badge with one pip per page number, and one
//! empty box per key point (up to three).
//!
//! Output is deterministic for a given page and style.

use crate::types::{PageOutline, Style};
use image::{Rgba, RgbaImage};

/// Placeholder size: the nominal page resolution.
pub const PLACEHOLDER_WIDTH: u32 = 825;
pub const PLACEHOLDER_HEIGHT: u32 = 1275;

const MAX_POINT_BOXES: usize = 3;

#[derive(Debug, Clone, Copy)]
enum Texture {
    Plain,
    Dots { spacing: u32, radius: u32, alpha: f32 },
    Patches { cell: u32, alpha: f32 },
}

#[derive(Debug, Clone, Copy)]
struct Palette {
    paper: [u8; 3],
    ink: [u8; 3],
    accent: [u8; 3],
    texture: Texture,
}

fn palette(style: Style) -> Palette {
    match style {
        Style::PunkZine => Palette {
            paper: [0xff, 0xff, 0xff],
            ink: [0x00, 0x00, 0x00],
            accent: [0xff, 0x00, 0x66],
            texture: Texture::Dots {
                spacing: 20,
                radius: 2,
                alpha: 0.3,
            },
        },
        Style::Mycelial => Palette {
            paper: [0xf5, 0xf0, 0xe8],
            ink: [0x2d, 0x3a, 0x2d],
            accent: [0x4a, 0x7c, 0x4f],
            texture: Texture::Dots {
                spacing: 30,
                radius: 1,
                alpha: 0.2,
            },
        },
        Style::Minimal => Palette {
            paper: [0xfa, 0xfa, 0xfa],
            ink: [0x33, 0x33, 0x33],
            accent: [0x00, 0x66, 0xff],
            texture: Texture::Plain,
        },
        Style::Collage => Palette {
            paper: [0xf5, 0xe6, 0xd3],
            ink: [0x2d, 0x2d, 0x2d],
            accent: [0x8b, 0x45, 0x13],
            texture: Texture::Patches {
                cell: 100,
                alpha: 0.5,
            },
        },
        Style::Retro => Palette {
            paper: [0xff, 0xf8, 0xdc],
            ink: [0x8b, 0x45, 0x13],
            accent: [0xff, 0x63, 0x47],
            texture: Texture::Dots {
                spacing: 8,
                radius: 1,
                alpha: 0.2,
            },
        },
    }
}

fn opaque([r, g, b]: [u8; 3]) -> Rgba<u8> {
    Rgba([r, g, b, 255])
}

fn blend(base: Rgba<u8>, [r, g, b]: [u8; 3], alpha: f32) -> Rgba<u8> {
    let mix = |under: u8, over: u8| {
        (f32::from(under) * (1.0 - alpha) + f32::from(over) * alpha).round() as u8
    };
    Rgba([mix(base[0], r), mix(base[1], g), mix(base[2], b), 255])
}

/// `[x, y, width, height]`
type Rect = [u32; 4];

fn fill_rect(img: &mut RgbaImage, [x, y, w, h]: Rect, color: Rgba<u8>) {
    let x_end = (x + w).min(img.width());
    let y_end = (y + h).min(img.height());
    for py in y..y_end {
        for px in x..x_end {
            img.put_pixel(px, py, color);
        }
    }
}

/// Rectangle outline of the given stroke width, drawn inward.
fn stroke_rect(img: &mut RgbaImage, [x, y, w, h]: Rect, stroke: u32, color: Rgba<u8>) {
    fill_rect(img, [x, y, w, stroke], color);
    fill_rect(img, [x, y + h - stroke, w, stroke], color);
    fill_rect(img, [x, y, stroke, h], color);
    fill_rect(img, [x + w - stroke, y, stroke, h], color);
}

fn apply_texture(img: &mut RgbaImage, palette: &Palette) {
    match palette.texture {
        Texture::Plain => {}
        Texture::Dots {
            spacing,
            radius,
            alpha,
        } => {
            let center = spacing / 2;
            let r2 = (radius * radius) as i64;
            for (x, y, px) in img.enumerate_pixels_mut() {
                let dx = (x % spacing) as i64 - center as i64;
                let dy = (y % spacing) as i64 - center as i64;
                if dx * dx + dy * dy <= r2 {
                    *px = blend(*px, palette.ink, alpha);
                }
            }
        }
        Texture::Patches { cell, alpha } => {
            let half = cell / 2;
            let shade = [0xeb, 0xe0, 0xd0];
            for (x, y, px) in img.enumerate_pixels_mut() {
                if x % cell < half && y % cell < half {
                    *px = blend(*px, shade, alpha);
                }
            }
        }
    }
}

/// Draw a placeholder for one page.
pub fn render_placeholder(page: &PageOutline, style: Style) -> RgbaImage {
    let palette = palette(style);
    let ink = opaque(palette.ink);
    let accent = opaque(palette.accent);
    let (w, h) = (PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT);

    let mut img = RgbaImage::from_pixel(w, h, opaque(palette.paper));
    apply_texture(&mut img, &palette);

    // Double frame
    stroke_rect(&mut img, [30, 30, w - 60, h - 60], 4, ink);
    stroke_rect(&mut img, [40, 40, w - 80, h - 80], 2, ink);

    // Page badge with one pip per page number
    fill_rect(&mut img, [60, 60, 80, 40], ink);
    for i in 0..u32::from(page.page_number.get()) {
        fill_rect(&mut img, [66 + i * 9, 76, 6, 8], opaque(palette.paper));
    }

    // Title rule
    fill_rect(&mut img, [150, 239, 525, 3], accent);

    for i in 0..page.key_points.len().min(MAX_POINT_BOXES) as u32 {
        stroke_rect(&mut img, [100, 350 + i * 120, 625, 80], 2, ink);
    }

    // Corner accents
    for (x, y) in [(30, 30), (w - 130, 30), (30, h - 34), (w - 130, h - 34)] {
        fill_rect(&mut img, [x, y, 100, 4], accent);
    }
    for (x, y) in [(30, 30), (w - 34, 30), (30, h - 130), (w - 34, h - 130)] {
        fill_rect(&mut img, [x, y, 4, 100], accent);
    }

    img
}
