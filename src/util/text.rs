//! Text helpers shared by the preview and highlighter

/// Escape text for inclusion in HTML element content or double-quoted
/// attribute values, the same way pulldown-cmark escapes its own output
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    pulldown_cmark_escape::escape_html(&mut escaped, text).expect("writing to a String cannot fail");
    escaped
}

/// Anchor slug: trimmed, lowercased, whitespace runs become `-`, and anything
/// outside `[a-z0-9-]` is dropped
pub fn slugify(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut in_whitespace = false;
    for ch in lowered.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                slug.push('-');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' {
            slug.push(ch);
        }
    }
    slug
}
