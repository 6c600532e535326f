//! # mycozine
//!
//! Mini-zine production: an 8-page outline, one image per page, and a single
//! print-ready sheet that folds into a booklet.
//!
//! # Architecture: Outline → Pages → Sheet
//!
//! ```text
//! 1. Outline   topic + style + tone  →  zine.json     (LLM response, cleaned and validated)
//! 2. Pages     outline               →  p1.png … p8.png (generated, regenerated, inpainted, or added by hand)
//! 3. Layout    8 page images         →  print.png     (3300×2550 @ 300 DPI, fold-ordered)
//! ```
//!
//! Each stage persists its result in the [`store`], so any page can be redone
//! and the sheet re-assembled without touching the others.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`layout`] | The print-layout compositor: fold table, cover-fit panels, sheet encoding |
//! | [`imaging`] | Pure-Rust pixel work behind the [`imaging::ImageBackend`] trait, plus placeholders |
//! | [`types`] | Zine data model: `PageNumber`, `PageOutline`, `Style`, `Tone`, `Zine` |
//! | [`outline`] | Cleaning and validating LLM outline responses |
//! | [`prompts`] | Prompt builders for the outline, image and inpainting collaborators |
//! | [`jobs`] | Regeneration modes and bounded polling of provider jobs |
//! | [`pipeline`] | Orchestration over collaborator traits; error → HTTP status mapping |
//! | [`store`] | `ZineStore` trait and the filesystem store |
//! | [`config`] | Sparse `config.toml` loading, merging, and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Fold Order Is Data
//!
//! Where each page prints is the literal table [`layout::PAGE_ARRANGEMENT`],
//! keyed by page number. It can be read, audited and tested on its own, and
//! nothing else in the crate encodes the fold.
//!
//! ## Collaborators Are Traits
//!
//! LLM and image providers sit behind [`pipeline::OutlineGenerator`],
//! [`pipeline::ImageGenerator`] and [`pipeline::Inpainter`]. The crate has no
//! HTTP client; provider clients implement the traits, and tests use scripted
//! fakes.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, resampling and PNG encoding use the `image` crate only. No
//! ImageMagick, no system libraries: the binary is self-contained.

pub mod config;
pub mod imaging;
pub mod jobs;
pub mod layout;
pub mod outline;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
