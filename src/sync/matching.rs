//! Approximate text correspondence between source lines and preview elements
//!
//! Exact position mapping between a monospace source grid and proportionally
//! laid-out HTML is not invertible, so both sync directions match normalized
//! text instead: trimmed, lowercased, and accepted when equal or when either
//! side contains the other.
//!
//! Known limitation: lines that are prefixes of each other all "match"; the
//! first hit in scan order wins.

use regex::Regex;

use super::{ElementKind, PreviewElement};

/// Trim and lowercase, the normalization both directions share
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Whether a candidate corresponds to an already-normalized search text.
///
/// Empty candidates never correspond: `"".contains` style matching would make
/// every blank line or empty element a hit for any search.
pub fn texts_correspond(candidate: &str, search: &str) -> bool {
    let normalized = normalize(candidate);
    if normalized.is_empty() || search.is_empty() {
        return false;
    }
    normalized == search || normalized.contains(search) || search.contains(normalized.as_str())
}

/// Preview element for a source line: headings first, then block elements,
/// each group in document order.
pub fn find_element_in_preview(elements: &[PreviewElement], line_text: &str) -> Option<usize> {
    let search = normalize(line_text);
    if search.is_empty() {
        return None;
    }

    let headings = elements.iter().filter(|el| el.kind.is_heading());
    let blocks = elements.iter().filter(|el| !el.kind.is_heading());

    headings
        .chain(blocks)
        .find(|el| texts_correspond(&el.text, &search))
        .map(|el| el.index)
}

/// 1-based number of the first source line corresponding to `text`
pub fn find_line_in_markdown(markdown: &str, text: &str) -> Option<usize> {
    let search = normalize(text);
    if search.is_empty() {
        return None;
    }

    markdown
        .split('\n')
        .position(|line| texts_correspond(line, &search))
        .map(|idx| idx + 1)
}

/// 1-based line of an ATX heading with this exact text and level.
///
/// Matches a whole line of `level` hashes, one space, the literal text, then
/// optional trailing whitespace and an optional `{#id}` attribute block.
pub fn find_heading_in_markdown(markdown: &str, text: &str, level: u8) -> Option<usize> {
    if !(1..=6).contains(&level) {
        return None;
    }

    let pattern = format!(
        r"(?m)^{} {}\s*(?:\{{#.*\}})?$",
        "#".repeat(level as usize),
        regex::escape(text)
    );
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            tracing::debug!("Heading pattern failed to compile: {}", e);
            return None;
        }
    };

    let found = re.find(markdown)?;
    Some(markdown[..found.start()].split('\n').count())
}

/// What the preview shows at the probe line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleElement {
    pub index: usize,
    pub text: String,
    /// Heading level when the element is `h1`..`h6`
    pub heading_level: Option<u8>,
}

/// Element nearest the probe line.
///
/// Prefers elements whose box straddles `probe_y`, picking the one whose top
/// is closest (first wins ties); otherwise the first element starting below it.
pub fn visible_element(elements: &[PreviewElement], probe_y: f32) -> Option<VisibleElement> {
    let mut closest: Option<(&PreviewElement, f32)> = None;
    for el in elements {
        if el.rect.top <= probe_y && el.rect.bottom >= probe_y {
            let distance = (el.rect.top - probe_y).abs();
            if closest.map_or(true, |(_, best)| distance < best) {
                closest = Some((el, distance));
            }
        }
    }

    let chosen = match closest {
        Some((el, _)) => el,
        None => elements.iter().find(|el| el.rect.top > probe_y)?,
    };

    let heading_level = match chosen.kind {
        ElementKind::Heading(level) => Some(level),
        _ => None,
    };

    Some(VisibleElement {
        index: chosen.index,
        text: chosen.text.trim().to_string(),
        heading_level,
    })
}

/// Resolve a visible preview element back to a 1-based source line
pub fn resolve_source_line(markdown: &str, visible: &VisibleElement) -> Option<usize> {
    match visible.heading_level {
        Some(level) => find_heading_in_markdown(markdown, &visible.text, level),
        None => find_line_in_markdown(markdown, &visible.text),
    }
}
