//! Prompt builders for the outline, image and inpainting collaborators.
//!
//! The descriptor tables translate a [`Style`] or [`Tone`] into the visual
//! and verbal vocabulary the generators respond to. Prompt wording is not a
//! contract; tests only pin down which inputs make it into each prompt.

use crate::types::{PAGE_COUNT, PageOutline, Style, Tone};

/// Default length cap for page-image prompts, in characters.
pub const DEFAULT_PROMPT_MAX_CHARS: usize = 500;

/// Visual vocabulary for each style.
pub fn style_descriptor(style: Style) -> &'static str {
    match style {
        Style::PunkZine => {
            "xerox-style high contrast black and white, DIY cut-and-paste collage aesthetic, \
             hand-drawn typography, punk rock zine style, grainy texture, photocopied look"
        }
        Style::Mycelial => {
            "organic mycelial network patterns, spore prints, earth tones with green accents, \
             fungal textures, underground root systems, natural decomposition aesthetic"
        }
        Style::Minimal => {
            "clean minimalist design, lots of white space, modern sans-serif typography, \
             simple geometric shapes, subtle gradients"
        }
        Style::Collage => {
            "layered mixed media collage, vintage photographs, torn paper edges, \
             overlapping textures, eclectic composition"
        }
        Style::Retro => {
            "1970s aesthetic, earth tones, groovy psychedelic typography, halftone dot patterns, \
             vintage illustration style"
        }
    }
}

/// Verbal vocabulary for each tone.
pub fn tone_descriptor(tone: Tone) -> &'static str {
    match tone {
        Tone::Rebellious => {
            "defiant anti-establishment energy, provocative bold statements, raw and unfiltered"
        }
        Tone::Regenerative => {
            "hopeful and healing, nature-inspired wisdom, interconnected systems thinking, \
             restoration and renewal"
        }
        Tone::Playful => "whimsical fun light-hearted energy, humor and wit, bright positive vibes",
        Tone::Informative => "educational and factual, clear explanations, structured information",
        Tone::Poetic => "lyrical and metaphorical, evocative imagery, emotional depth",
    }
}

/// Lettering hints for inpainted text, per style.
fn typography_hint(style: Style) -> &'static str {
    match style {
        Style::PunkZine => "punk zine aesthetic, bold hand-drawn lettering, screen-printed style",
        Style::Mycelial => "organic zine typography, hand-inked letterforms, earthy texture",
        Style::Minimal => "clean minimal design, modern sans-serif typography",
        Style::Collage => "collage art style, cut-out letters, mixed media typography",
        Style::Retro => "vintage retro style, distressed typography, aged paper texture",
    }
}

/// Lettering mood for inpainted text, per tone.
fn lettering_mood(tone: Tone) -> &'static str {
    match tone {
        Tone::Rebellious => "bold, confrontational, high-contrast",
        Tone::Regenerative => "calm, balanced, readable",
        Tone::Playful => "fun, whimsical, energetic",
        Tone::Informative => "clear, educational, professional",
        Tone::Poetic => "artistic, expressive, lyrical",
    }
}

/// Cut `text` to at most `max_chars` characters, never inside a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}

/// Prompt asking the outline collaborator for an 8-page plan as JSON.
pub fn outline_prompt(topic: &str, style: Style, tone: Tone) -> String {
    format!(
        r#"You are creating an {PAGE_COUNT}-page mini-zine that folds from a single sheet of paper.

Topic: {topic}
Visual Style: {style} - {style_desc}
Tone: {tone} - {tone_desc}

Create a detailed outline for all {PAGE_COUNT} pages. Each page has a distinct purpose:
- Page 1: Cover (eye-catching title and central image)
- Page 2: Introduction (hook the reader, set the stage)
- Pages 3-6: Main content (key concepts, stories, visuals)
- Page 7: Resources or deeper dive
- Page 8: Call to action (what the reader should do next)

Return ONLY valid JSON in this exact format (no markdown, no code blocks):
{{
  "pages": [
    {{
      "pageNumber": 1,
      "type": "cover",
      "title": "Short punchy title",
      "keyPoints": ["Main visual concept", "Tagline or subtitle"],
      "imagePrompt": "Detailed prompt for generating the page image including style elements"
    }}
  ]
}}

Allowed types: cover, intro, content, resources, call-to-action.
Make each imagePrompt detailed and specific to the {style} visual style."#,
        style_desc = style_descriptor(style),
        tone_desc = tone_descriptor(tone),
    )
}

/// Compact prompt for rendering one page image.
///
/// Image models have short prompt budgets, so the result is cut to
/// `max_chars` characters; the title and key points come first and survive.
pub fn page_image_prompt(
    page: &PageOutline,
    style: Style,
    tone: Tone,
    feedback: Option<&str>,
    max_chars: usize,
) -> String {
    let mut prompt = format!(
        "{}, {}, {}, {}, {}, zine page design, printable art, high quality illustration",
        page.title,
        page.key_points.join(", "),
        style_descriptor(style),
        tone_descriptor(tone),
        page.image_prompt,
    );
    if let Some(feedback) = feedback.map(str::trim).filter(|f| !f.is_empty()) {
        prompt.push_str(", ");
        prompt.push_str(feedback);
    }
    truncate_chars(&prompt, max_chars).to_string()
}

/// Prompt asking the outline collaborator to revise one page.
pub fn refine_prompt(current: &PageOutline, feedback: &str, style: Style, tone: Tone) -> String {
    // PageOutline always serializes
    let current_json = serde_json::to_string_pretty(current).unwrap_or_default();
    format!(
        r#"You are refining a zine page based on user feedback.

Current page outline:
{current_json}

User feedback: "{feedback}"

Style: {style}
Tone: {tone}

Update the page outline to incorporate this feedback. Keep the same page number and type, but update title, keyPoints, and imagePrompt as needed.

Return ONLY valid JSON (no markdown, no code blocks):
{{
  "pageNumber": {number},
  "type": "{page_type}",
  "title": "Updated title",
  "keyPoints": ["Updated point 1", "Updated point 2"],
  "imagePrompt": "Updated detailed image prompt"
}}"#,
        number = current.page_number,
        page_type = current.page_type,
    )
}

/// Prompt for replacing the text inside a masked region.
pub fn text_inpaint_prompt(new_text: &str, style: Style, tone: Tone) -> String {
    format!(
        "{}. The text clearly reads: \"{}\". {} aesthetic. Bold, clear lettering that \
         integrates seamlessly with the surrounding design. High contrast for readability.",
        typography_hint(style),
        new_text.trim(),
        lettering_mood(tone),
    )
}
