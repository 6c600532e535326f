//! Parsing of LLM outline responses.
//!
//! Model output is "JSON, mostly": it may be wrapped in a markdown fence,
//! surrounded by chatter, carry trailing commas or raw control characters.
//! [`clean_response`] repairs those before `serde_json` sees the text:
//!
//! 1. If a fenced code block is present, keep only its body.
//! 2. Keep the outermost `{ … }` object.
//! 3. Drop trailing commas before `}` or `]`.
//! 4. Turn escaped newlines and raw control characters into spaces.
//!
//! Validation happens after deserialization: an outline must have exactly 8
//! pages numbered 1–8 with non-empty titles.

use crate::types::{PAGE_COUNT, PageNumber, PageOutline, PageType};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("No JSON object found in response")]
    NoJson,
    #[error("Invalid outline JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Expected {PAGE_COUNT} pages, got {found}")]
    PageCount { found: usize },
    #[error("Page numbers must be 1-{PAGE_COUNT}, each exactly once")]
    PageNumbers,
    #[error("Page {page} has an empty title")]
    EmptyTitle { page: PageNumber },
    #[error("Refinement changed page {page} ({expected}) into page {found_page} ({found})")]
    ChangedPage {
        page: PageNumber,
        expected: PageType,
        found_page: PageNumber,
        found: PageType,
    },
}

#[derive(Deserialize)]
struct OutlineResponse {
    pages: Vec<PageOutline>,
}

/// Body of the first fenced code block, if any (an optional `json` tag is
/// skipped).
fn fenced_body(text: &str) -> Option<&str> {
    let start = text.find("```")? + 3;
    let rest = &text[start..];
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let end = rest.find("```")?;
    Some(rest[..end].trim())
}

/// Outermost `{ … }` span: first `{` to last `}`.
fn outer_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == ',' {
            let next = chars[i + 1..].iter().position(|c| !c.is_whitespace());
            if let Some(offset) = next.filter(|&o| matches!(chars[i + 1 + o], '}' | ']')) {
                // Skip the comma and the whitespace after it
                i += 1 + offset;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

fn blank_control_chars(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev = '\0';
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' && prev != '\\' && chars.peek() == Some(&'n') {
            chars.next();
            out.push(' ');
            prev = ' ';
            continue;
        }
        let c = if c.is_ascii_control() { ' ' } else { c };
        out.push(c);
        prev = c;
    }
    out
}

/// Repair a raw model response into parseable JSON text.
pub fn clean_response(response: &str) -> Result<String, ParseError> {
    let body = if response.contains("```") {
        fenced_body(response).unwrap_or(response)
    } else {
        response
    };
    let object = outer_object(body).ok_or(ParseError::NoJson)?;
    Ok(blank_control_chars(&strip_trailing_commas(object.trim())))
}

fn validate_title(page: &PageOutline) -> Result<(), ParseError> {
    if page.title.trim().is_empty() {
        return Err(ParseError::EmptyTitle {
            page: page.page_number,
        });
    }
    Ok(())
}

/// Parse a full 8-page outline. Pages come back sorted by page number.
pub fn parse_outline(response: &str) -> Result<Vec<PageOutline>, ParseError> {
    let cleaned = clean_response(response)?;
    let OutlineResponse { mut pages } = serde_json::from_str(&cleaned)?;

    if pages.len() != PAGE_COUNT {
        return Err(ParseError::PageCount { found: pages.len() });
    }
    pages.sort_by_key(|p| p.page_number);
    let contiguous = pages
        .iter()
        .zip(PageNumber::all())
        .all(|(page, n)| page.page_number == n);
    if !contiguous {
        return Err(ParseError::PageNumbers);
    }
    for page in &pages {
        validate_title(page)?;
    }
    Ok(pages)
}

/// Parse a single refined page; it must keep its page number and type.
pub fn parse_page_refinement(
    response: &str,
    current: &PageOutline,
) -> Result<PageOutline, ParseError> {
    let cleaned = clean_response(response)?;
    let refined: PageOutline = serde_json::from_str(&cleaned)?;
    if refined.page_number != current.page_number || refined.page_type != current.page_type {
        return Err(ParseError::ChangedPage {
            page: current.page_number,
            expected: current.page_type,
            found_page: refined.page_number,
            found: refined.page_type,
        });
    }
    validate_title(&refined)?;
    Ok(refined)
}
