//! Highlighting tests - lazy grammar registration and preview code blocks

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use markon::preview::render_preview;
use markon::syntax::{GrammarLoader, GrammarModule, GrammarRegistry, Highlighter};

/// Registry whose loaders count how often they run
fn counting_registry(names: &[&str]) -> (GrammarRegistry, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let loaders = names.iter().map(|&name| {
        let calls = Arc::clone(&calls);
        let loader: GrammarLoader = Arc::new(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            Some(GrammarModule {
                language: tree_sitter_rust::LANGUAGE.into(),
                highlights_query: tree_sitter_rust::HIGHLIGHTS_QUERY,
            })
        });
        (name.to_string(), loader)
    });
    (GrammarRegistry::with_loaders(loaders), calls)
}

#[test]
fn test_each_grammar_loads_at_most_once() {
    let (registry, calls) = counting_registry(&["rust"]);
    let mut highlighter = Highlighter::with_registry(registry);

    let markdown = "```rust\nfn a() {}\n```\n\n```rs\nfn b() {}\n```\n";
    for _ in 0..3 {
        let mut tree = render_preview(markdown);
        highlighter.highlight_all(&mut tree);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(highlighter.registry().is_loaded("rust"));
}

#[test]
fn test_failed_grammar_is_not_retried() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let loader: GrammarLoader = Arc::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        None
    });
    let registry = GrammarRegistry::with_loaders([("python".to_string(), loader)]);
    let mut highlighter = Highlighter::with_registry(registry);

    for _ in 0..3 {
        let mut tree = render_preview("```py\nprint(1)\n```\n");
        let report = highlighter.highlight_all(&mut tree);
        assert_eq!(report.highlighted, 0);
        assert!(tree.code_blocks()[0].highlighted.is_none());
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(highlighter.registry().has_failed("python"));
}

#[test]
fn test_distinct_grammars_load_in_one_pass() {
    let (registry, calls) = counting_registry(&["rust", "go", "c"]);
    let mut highlighter = Highlighter::with_registry(registry);

    let mut tree = render_preview("```rust\nfn a(){}\n```\n\n```golang\nx\n```\n\n```c\ny\n```\n");
    let report = highlighter.highlight_all(&mut tree);

    assert_eq!(report.blocks, 3);
    assert_eq!(report.grammars_loaded, 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_language_classes_are_canonicalized() {
    let mut highlighter = Highlighter::new();
    let mut tree = render_preview("```Rust\nfn main() {}\n```\n\n```html\n<p>hi</p>\n```\n");
    highlighter.highlight_all(&mut tree);

    assert_eq!(tree.code_blocks()[0].classes, vec!["language-rust"]);
    assert_eq!(tree.code_blocks()[1].classes, vec!["language-xml"]);

    let html = tree.to_html();
    assert!(html.contains("<code class=\"language-rust\">"));
    assert!(html.contains("<span class=\"hl-"));
}

#[test]
fn test_unknown_language_keeps_escaped_text() {
    let mut highlighter = Highlighter::new();
    let mut tree = render_preview("```klingon\nqapla' <b>\n```\n\n```rust\nfn x() {}\n```\n");
    let report = highlighter.highlight_all(&mut tree);

    assert_eq!(report.blocks, 2);
    assert_eq!(report.highlighted, 1);
    assert!(tree.code_blocks()[0].highlighted.is_none());
    assert!(tree.to_html().contains("qapla' &lt;b&gt;"));
}

#[test]
fn test_unchanged_blocks_are_served_from_cache() {
    let mut highlighter = Highlighter::new();
    let markdown = "```python\ndef f():\n    return 1\n```\n";

    let mut first = render_preview(markdown);
    let report = highlighter.highlight_all(&mut first);
    assert_eq!(report.cache_hits, 0);

    let mut second = render_preview(markdown);
    let report = highlighter.highlight_all(&mut second);
    assert_eq!(report.cache_hits, 1);
    assert_eq!(first.to_html(), second.to_html());
}
