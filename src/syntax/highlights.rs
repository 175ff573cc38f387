//! Highlight capture names and spans
//!
//! Tree-sitter queries emit hierarchical capture names (`keyword.control.import`);
//! these are folded onto a fixed set of names, each rendered as an `hl-*` class.

/// Capture names recognized by the highlighter.
/// Index into this array is the HighlightId.
pub const HIGHLIGHT_NAMES: &[&str] = &[
    "attribute",             // @attribute
    "boolean",               // @boolean (true, false)
    "comment",               // @comment
    "constant",              // @constant
    "constant.builtin",      // @constant.builtin (null, nil)
    "constructor",           // @constructor (new Foo)
    "escape",                // @escape (string escapes)
    "function",              // @function
    "function.builtin",      // @function.builtin (echo, print)
    "function.method",       // @function.method
    "keyword",               // @keyword
    "keyword.return",        // @keyword.return
    "keyword.function",      // @keyword.function (function, fn)
    "keyword.operator",      // @keyword.operator (and, or)
    "label",                 // @label
    "number",                // @number
    "operator",              // @operator
    "property",              // @property
    "punctuation",           // @punctuation (general)
    "punctuation.bracket",   // @punctuation.bracket
    "punctuation.delimiter", // @punctuation.delimiter
    "punctuation.special",   // @punctuation.special
    "string",                // @string
    "string.special",        // @string.special (regex, heredoc)
    "tag",                   // @tag (XML tags)
    "tag.attribute",         // @tag.attribute
    "type",                  // @type
    "type.builtin",          // @type.builtin (int, string, bool)
    "variable",              // @variable
    "variable.builtin",      // @variable.builtin ($this, self)
    "variable.parameter",    // @variable.parameter
];

/// Index into HIGHLIGHT_NAMES
pub type HighlightId = u16;

/// A highlighted byte range of a code block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightSpan {
    pub start: usize,
    pub end: usize,
    pub highlight: HighlightId,
}

/// Look up highlight ID by capture name
pub fn highlight_id_for_name(name: &str) -> Option<HighlightId> {
    // Try the exact name, then progressively shorter parents
    // ("keyword.control.import" -> "keyword.control" -> "keyword").
    let mut current = name;
    loop {
        if let Some(pos) = HIGHLIGHT_NAMES.iter().position(|&n| n == current) {
            return Some(pos as HighlightId);
        }
        let Some(dot_pos) = current.rfind('.') else {
            break;
        };
        current = &current[..dot_pos];
    }
    None
}

/// CSS class for a highlight: `keyword.function` -> `hl-keyword-function`
pub fn css_class(id: HighlightId) -> Option<String> {
    HIGHLIGHT_NAMES
        .get(id as usize)
        .map(|name| format!("hl-{}", name.replace('.', "-")))
}

/// Flatten possibly overlapping captures into disjoint spans.
///
/// Sorted by start; where captures overlap, the earlier-starting one keeps its
/// range and later ones are clipped to begin after it.
pub fn flatten_spans(mut spans: Vec<HighlightSpan>) -> Vec<HighlightSpan> {
    spans.sort_by_key(|s| (s.start, std::cmp::Reverse(s.end)));

    let mut flat: Vec<HighlightSpan> = Vec::with_capacity(spans.len());
    let mut covered_to = 0;
    for span in spans {
        let start = span.start.max(covered_to);
        if start >= span.end {
            continue;
        }
        flat.push(HighlightSpan { start, ..span });
        covered_to = span.end;
    }
    flat
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_id_lookup() {
        assert!(highlight_id_for_name("keyword").is_some());
        assert!(highlight_id_for_name("keyword.function").is_some());
        assert_eq!(
            highlight_id_for_name("keyword.control.import"),
            highlight_id_for_name("keyword")
        );
        assert!(highlight_id_for_name("string").is_some());
        assert!(highlight_id_for_name("nonexistent").is_none());
    }

    #[test]
    fn test_css_class() {
        let id = highlight_id_for_name("punctuation.bracket").unwrap();
        assert_eq!(css_class(id).as_deref(), Some("hl-punctuation-bracket"));
        assert_eq!(css_class(u16::MAX), None);
    }

    #[test]
    fn test_flatten_spans_clips_overlaps() {
        let spans = vec![
            HighlightSpan { start: 4, end: 8, highlight: 2 },
            HighlightSpan { start: 0, end: 6, highlight: 1 },
            HighlightSpan { start: 0, end: 3, highlight: 3 },
            HighlightSpan { start: 10, end: 12, highlight: 4 },
        ];
        assert_eq!(
            flatten_spans(spans),
            vec![
                HighlightSpan { start: 0, end: 6, highlight: 1 },
                HighlightSpan { start: 6, end: 8, highlight: 2 },
                HighlightSpan { start: 10, end: 12, highlight: 4 },
            ]
        );
    }
}
