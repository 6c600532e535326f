//! Zine data model shared by the store, the pipeline and the compositor.
//!
//! A zine always has exactly [`PAGE_COUNT`] pages. Page slots are addressed by
//! [`PageNumber`] (1–8), never by position in some other list, so the outline
//! slot, the image slot and the print panel for a page can't drift apart.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pages in a single-sheet mini-zine.
pub const PAGE_COUNT: usize = 8;

/// A page number in `1..=8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PageNumber(u8);

impl PageNumber {
    pub const fn new(n: u8) -> Option<Self> {
        if n >= 1 && n <= PAGE_COUNT as u8 {
            Some(Self(n))
        } else {
            None
        }
    }

    /// All page numbers in reading order.
    pub fn all() -> impl Iterator<Item = PageNumber> {
        (1..=PAGE_COUNT as u8).map(PageNumber)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Zero-based slot in the 8-entry page arrays.
    pub fn index(self) -> usize {
        self.0 as usize - 1
    }
}

impl TryFrom<u8> for PageNumber {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        PageNumber::new(n).ok_or_else(|| format!("page number {n} is outside 1..={PAGE_COUNT}"))
    }
}

impl From<PageNumber> for u8 {
    fn from(p: PageNumber) -> u8 {
        p.0
    }
}

impl fmt::Display for PageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PageNumber {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: u8 = s
            .trim()
            .parse()
            .map_err(|_| format!("'{s}' is not a page number"))?;
        PageNumber::try_from(n)
    }
}

/// The purpose of a page within the zine.
///
/// Purely editorial: it steers prompts, never the print position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageType {
    Cover,
    Intro,
    Content,
    Resources,
    CallToAction,
}

impl PageType {
    pub fn as_str(self) -> &'static str {
        match self {
            PageType::Cover => "cover",
            PageType::Intro => "intro",
            PageType::Content => "content",
            PageType::Resources => "resources",
            PageType::CallToAction => "call-to-action",
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured plan for one page, as produced by the outline collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageOutline {
    pub page_number: PageNumber,
    #[serde(rename = "type")]
    pub page_type: PageType,
    pub title: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub image_prompt: String,
}

/// Visual style requested for the whole zine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Style {
    PunkZine,
    #[default]
    Mycelial,
    Minimal,
    Collage,
    Retro,
}

impl Style {
    pub fn as_str(self) -> &'static str {
        match self {
            Style::PunkZine => "punk-zine",
            Style::Mycelial => "mycelial",
            Style::Minimal => "minimal",
            Style::Collage => "collage",
            Style::Retro => "retro",
        }
    }

    /// Lenient lookup for names coming from request bodies: unknown → default.
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "punk-zine" => Style::PunkZine,
            "minimal" => Style::Minimal,
            "collage" => Style::Collage,
            "retro" => Style::Retro,
            _ => Style::Mycelial,
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Voice requested for the whole zine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Tone {
    Rebellious,
    #[default]
    Regenerative,
    Playful,
    Informative,
    Poetic,
}

impl Tone {
    pub fn as_str(self) -> &'static str {
        match self {
            Tone::Rebellious => "rebellious",
            Tone::Regenerative => "regenerative",
            Tone::Playful => "playful",
            Tone::Informative => "informative",
            Tone::Poetic => "poetic",
        }
    }

    /// Lenient lookup for names coming from request bodies: unknown → default.
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "rebellious" => Tone::Rebellious,
            "playful" => Tone::Playful,
            "informative" => Tone::Informative,
            "poetic" => Tone::Poetic,
            _ => Tone::Regenerative,
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A zine: its brief, its 8-page outline and the current image for each page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ZineRecord")]
pub struct Zine {
    pub id: String,
    pub topic: String,
    pub style: Style,
    pub tone: Tone,
    /// Always 8 entries; `outline[i].page_number == i + 1`.
    pub outline: Vec<PageOutline>,
    /// Store reference of each page image, `None` until the page is rendered.
    pub pages: Vec<Option<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `zine.json` as read from disk, before the page slots are checked.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ZineRecord {
    id: String,
    topic: String,
    style: Style,
    tone: Tone,
    outline: Vec<PageOutline>,
    pages: Vec<Option<String>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ZineRecord> for Zine {
    type Error = String;

    fn try_from(record: ZineRecord) -> Result<Self, Self::Error> {
        if !is_contiguous(&record.outline) {
            return Err(format!(
                "outline must hold pages 1..={PAGE_COUNT} in order, got {} entries",
                record.outline.len()
            ));
        }
        if record.pages.len() != PAGE_COUNT {
            return Err(format!(
                "expected {PAGE_COUNT} page slots, got {}",
                record.pages.len()
            ));
        }
        Ok(Self {
            id: record.id,
            topic: record.topic,
            style: record.style,
            tone: record.tone,
            outline: record.outline,
            pages: record.pages,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

/// True when `outline` holds exactly pages 1..=8, in order.
fn is_contiguous(outline: &[PageOutline]) -> bool {
    outline.len() == PAGE_COUNT
        && outline
            .iter()
            .zip(PageNumber::all())
            .all(|(page, n)| page.page_number == n)
}

impl Zine {
    /// Create a zine from a validated outline.
    ///
    /// Returns `None` unless `outline` holds pages 1..=8 in order.
    pub fn new(topic: &str, style: Style, tone: Tone, outline: Vec<PageOutline>) -> Option<Self> {
        if !is_contiguous(&outline) {
            return None;
        }
        let now = Utc::now();
        Some(Self {
            id: uuid::Uuid::new_v4().to_string(),
            topic: topic.to_string(),
            style,
            tone,
            outline,
            pages: vec![None; PAGE_COUNT],
            created_at: now,
            updated_at: now,
        })
    }

    pub fn page(&self, page: PageNumber) -> &PageOutline {
        &self.outline[page.index()]
    }

    pub fn page_ref(&self, page: PageNumber) -> Option<&str> {
        self.pages.get(page.index()).and_then(|p| p.as_deref())
    }

    /// Record a new image reference for a page and bump `updated_at`.
    pub fn set_page_ref(&mut self, page: PageNumber, reference: String) {
        if self.pages.len() != PAGE_COUNT {
            self.pages.resize(PAGE_COUNT, None);
        }
        self.pages[page.index()] = Some(reference);
        self.touch();
    }

    /// Replace a page's outline, keeping it in its slot.
    pub fn set_outline(&mut self, outline: PageOutline) {
        let slot = outline.page_number.index();
        self.outline[slot] = outline;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Pages that have an image reference.
    pub fn rendered_count(&self) -> usize {
        self.pages.iter().filter(|p| p.is_some()).count()
    }
}
