//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Output is **page-centric, not file-centric**. Every page leads with its
//! number and title; the stored image, its size and its fit on the sheet are
//! indented context lines underneath. This reads as a proof of the zine while
//! still letting users trace each page back to a file in the store.
//!
//! # Output Format
//!
//! ## Outline
//!
//! ```text
//! Zine 3f2c9a…
//!     Topic: mushrooms
//!     Style: mycelial, tone: regenerative
//! 1 Spore Print (cover)
//!     - A field guide to the hidden kingdom
//!     Image: 3f2c9a…/p1.png
//! 2 Look Down (intro)
//!     Image: missing
//! ```
//!
//! ## Check
//!
//! ```text
//! 1 Spore Print (cover)
//!     825x1275 nominal
//! 2 Look Down (intro)
//!     1000x1000 cover-fit ×1.275, crop 225,0
//! 3 The Wood Wide Web (content)
//!     missing
//!
//! 7 of 8 pages ready
//! ```
//!
//! ## Layout
//!
//! ```text
//! Sheet 3300x2550 @ 300 DPI → 3f2c9a…/print.png
//!     Top row (180°): 1 8 7 6
//!     Bottom row: 2 3 4 5
//!     SHA-256: 9e1c…
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::layout::{PAGE_ARRANGEMENT, PRINT_DPI, PrintLayout};
use crate::pipeline::{PageCheck, PageStatus};
use crate::types::{PAGE_COUNT, PageOutline, Zine};

// ============================================================================
// Shared display helpers
// ============================================================================

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Page header: number, title and editorial type.
///
/// ```text
/// 3 The Wood Wide Web (content)
/// ```
fn page_header(page: &PageOutline) -> String {
    format!("{} {} ({})", page.page_number, page.title, page.page_type)
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_text(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte, _)) => format!("{}...", &text[..byte]),
        None => text.to_string(),
    }
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

// ============================================================================
// Outline
// ============================================================================

/// Format a zine's brief and outline, with each page's stored image.
pub fn format_outline(zine: &Zine) -> Vec<String> {
    let mut lines = vec![
        format!("Zine {}", zine.id),
        format!("{}Topic: {}", indent(1), zine.topic),
        format!("{}Style: {}, tone: {}", indent(1), zine.style, zine.tone),
    ];
    for page in &zine.outline {
        lines.push(page_header(page));
        for point in &page.key_points {
            lines.push(format!("{}- {}", indent(1), point));
        }
        let image = zine.page_ref(page.page_number).unwrap_or("missing");
        lines.push(format!("{}Image: {}", indent(1), image));
    }
    lines
}

pub fn print_outline(zine: &Zine) {
    print_lines(format_outline(zine));
}

// ============================================================================
// Check
// ============================================================================

fn format_status(status: &PageStatus) -> String {
    match status {
        PageStatus::Missing => "missing".to_string(),
        PageStatus::Unreadable(reason) => format!("unreadable: {}", truncate_text(reason, 60)),
        PageStatus::Ready { width, height, fit } if fit.is_exact() => {
            format!("{width}x{height} nominal")
        }
        PageStatus::Ready { width, height, fit } if fit.crops() => format!(
            "{width}x{height} cover-fit ×{:.3}, crop {},{}",
            fit.scale, fit.crop.0, fit.crop.1
        ),
        PageStatus::Ready { width, height, fit } => {
            format!("{width}x{height} cover-fit ×{:.3}", fit.scale)
        }
    }
}

/// Format the per-page readiness report of `check`.
pub fn format_check_report(checks: &[PageCheck]) -> Vec<String> {
    let mut lines = Vec::new();
    for check in checks {
        lines.push(page_header(&check.outline));
        lines.push(format!("{}{}", indent(1), format_status(&check.status)));
    }
    let ready = checks.iter().filter(|c| c.is_ready()).count();
    lines.push(String::new());
    lines.push(format!("{ready} of {PAGE_COUNT} pages ready"));
    lines
}

pub fn print_check_report(checks: &[PageCheck]) {
    print_lines(format_check_report(checks));
}

// ============================================================================
// Layout
// ============================================================================

fn row_pages(row: u32) -> String {
    PAGE_ARRANGEMENT
        .iter()
        .filter(|p| p.row == row)
        .map(|p| p.page.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format the result of `layout`: sheet size, fold order, and digest.
pub fn format_layout_result(reference: &str, layout: &PrintLayout) -> Vec<String> {
    vec![
        format!(
            "Sheet {}x{} @ {} DPI → {}",
            layout.width, layout.height, PRINT_DPI, reference
        ),
        format!("{}Top row (180°): {}", indent(1), row_pages(0)),
        format!("{}Bottom row: {}", indent(1), row_pages(1)),
        format!("{}SHA-256: {}", indent(1), layout.digest),
    ]
}

pub fn print_layout_result(reference: &str, layout: &PrintLayout) {
    print_lines(format_layout_result(reference, layout));
}

// ============================================================================
// List
// ============================================================================

/// Format the zines in a store, oldest first.
///
/// ```text
/// 3f2c9a… mushrooms (6/8 pages)
///     mycelial, regenerative, 2026-10-19 14:02
/// ```
pub fn format_zine_list(zines: &[Zine]) -> Vec<String> {
    if zines.is_empty() {
        return vec!["No zines".to_string()];
    }
    let mut lines = Vec::new();
    for zine in zines {
        lines.push(format!(
            "{} {} ({}/{} pages)",
            zine.id,
            truncate_text(&zine.topic, 40),
            zine.rendered_count(),
            PAGE_COUNT
        ));
        lines.push(format!(
            "{}{}, {}, {}",
            indent(1),
            zine.style,
            zine.tone,
            zine.created_at.format("%Y-%m-%d %H:%M")
        ));
    }
    lines
}

pub fn print_zine_list(zines: &[Zine]) {
    print_lines(format_zine_list(zines));
}
