//! Code block highlighting for the rendered preview

use std::collections::HashMap;

use super::highlights::{css_class, HighlightSpan};
use super::languages::{language_token, resolve_grammar};
use super::registry::GrammarRegistry;
use crate::preview::PreviewTree;
use crate::util::text::escape_html;

/// Maximum number of cached highlight results before the cache is cleared
const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Outcome of one [`Highlighter::highlight_all`] pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HighlightReport {
    /// Code blocks found in the tree
    pub blocks: usize,
    /// Blocks that received highlighted markup
    pub highlighted: usize,
    /// Grammars newly registered by this pass
    pub grammars_loaded: usize,
    /// Highlighted blocks served from the cache
    pub cache_hits: usize,
}

pub struct Highlighter {
    registry: GrammarRegistry,
    cache: HashMap<(String, String), String>,
    cache_capacity: usize,
}

impl Highlighter {
    pub fn new() -> Self {
        Self::with_registry(GrammarRegistry::new())
    }

    pub fn with_registry(registry: GrammarRegistry) -> Self {
        Self {
            registry,
            cache: HashMap::new(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity.max(1);
        self
    }

    pub fn registry(&self) -> &GrammarRegistry {
        &self.registry
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    /// Highlight every `pre > code` block of a freshly rendered tree.
    ///
    /// Grammars for all blocks are loaded up front (in parallel), then each
    /// block with a resolvable grammar gets a canonical `language-<grammar>`
    /// class and highlighted markup. Blocks whose grammar cannot be loaded keep
    /// their escaped text.
    pub fn highlight_all(&mut self, tree: &mut PreviewTree) -> HighlightReport {
        let mut report = HighlightReport {
            blocks: tree.code_blocks().len(),
            ..HighlightReport::default()
        };
        if report.blocks == 0 {
            return report;
        }

        let grammars: Vec<Option<String>> = tree
            .code_blocks()
            .iter()
            .map(|block| language_token(&block.classes).and_then(resolve_grammar))
            .collect();

        let mut unique: Vec<&str> = Vec::new();
        for grammar in grammars.iter().flatten() {
            if !unique.contains(&grammar.as_str()) {
                unique.push(grammar);
            }
        }
        report.grammars_loaded = self.registry.ensure_loaded(&unique);

        for (block, grammar) in tree.code_blocks_mut().iter_mut().zip(&grammars) {
            let Some(grammar) = grammar else {
                continue;
            };

            block.classes.retain(|class| !class.starts_with("language-"));
            block.classes.push(format!("language-{}", grammar));

            let cached = self.is_cached(grammar, &block.code);
            match self.highlight_code(grammar, &block.code) {
                Some(html) => {
                    block.highlighted = Some(html);
                    report.highlighted += 1;
                    if cached {
                        report.cache_hits += 1;
                    }
                }
                None => {
                    tracing::trace!(grammar = %grammar, "Code block left unhighlighted");
                    block.highlighted = None;
                }
            }
        }

        tracing::debug!(
            blocks = report.blocks,
            highlighted = report.highlighted,
            loaded = report.grammars_loaded,
            "Highlighted preview code blocks"
        );
        report
    }

    fn is_cached(&self, grammar: &str, code: &str) -> bool {
        self.cache
            .contains_key(&(grammar.to_string(), code.to_string()))
    }

    /// Highlighted HTML for `code`, or `None` when the grammar is unavailable
    pub fn highlight_code(&mut self, grammar: &str, code: &str) -> Option<String> {
        let key = (grammar.to_string(), code.to_string());
        if let Some(html) = self.cache.get(&key) {
            return Some(html.clone());
        }

        self.registry.ensure_loaded(&[grammar]);
        let loaded = self.registry.get(grammar)?;
        let html = render_spans(code, &loaded.highlight(code));

        if self.cache.len() >= self.cache_capacity {
            self.cache.clear();
        }
        self.cache.insert(key, html.clone());
        Some(html)
    }
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrap each span in `<span class="hl-*">`, escaping everything
fn render_spans(code: &str, spans: &[HighlightSpan]) -> String {
    let mut html = String::with_capacity(code.len() * 2);
    let mut pos = 0;

    for span in spans {
        let (Some(gap), Some(text)) = (code.get(pos..span.start), code.get(span.start..span.end))
        else {
            continue;
        };
        html.push_str(&escape_html(gap));
        match css_class(span.highlight) {
            Some(class) => {
                html.push_str("<span class=\"");
                html.push_str(&class);
                html.push_str("\">");
                html.push_str(&escape_html(text));
                html.push_str("</span>");
            }
            None => html.push_str(&escape_html(text)),
        }
        pos = span.end;
    }

    html.push_str(&escape_html(code.get(pos..).unwrap_or("")));
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::render_preview;
    use crate::syntax::highlight_id_for_name;

    #[test]
    fn test_render_spans_escapes_and_wraps() {
        let code = "a<b && c";
        let keyword = highlight_id_for_name("keyword").unwrap();
        let spans = [HighlightSpan {
            start: 2,
            end: 8,
            highlight: keyword,
        }];
        assert_eq!(
            render_spans(code, &spans),
            "a&lt;<span class=\"hl-keyword\">b &amp;&amp; c</span>"
        );
    }

    #[test]
    fn test_highlight_all_canonicalizes_and_highlights() {
        let mut tree = render_preview("```rs\nfn main() {}\n```\n\n```nosuchlang\nx\n```\n");
        let mut highlighter = Highlighter::new();

        let report = highlighter.highlight_all(&mut tree);
        assert_eq!(report.blocks, 2);
        assert_eq!(report.highlighted, 1);
        assert_eq!(report.grammars_loaded, 1);

        let blocks = tree.code_blocks();
        assert_eq!(blocks[0].classes, vec!["language-rust"]);
        assert!(blocks[0]
            .highlighted
            .as_deref()
            .is_some_and(|html| html.contains("hl-")));
        assert_eq!(blocks[1].classes, vec!["language-nosuchlang"]);
        assert!(blocks[1].highlighted.is_none());
    }

    #[test]
    fn test_rerender_hits_cache() {
        let markdown = "```python\nprint('hi')\n```\n";
        let mut highlighter = Highlighter::new();

        let mut first = render_preview(markdown);
        assert_eq!(highlighter.highlight_all(&mut first).cache_hits, 0);

        let mut second = render_preview(markdown);
        let report = highlighter.highlight_all(&mut second);
        assert_eq!(report.cache_hits, 1);
        assert_eq!(report.grammars_loaded, 0);
        assert_eq!(first.to_html(), second.to_html());
    }

    #[test]
    fn test_cache_is_bounded() {
        let mut highlighter = Highlighter::new().with_cache_capacity(2);
        for i in 0..5 {
            highlighter.highlight_code("rust", &format!("let x = {};", i));
        }
        assert!(highlighter.cached_entries() <= 2);
    }
}
