//! Lazily populated grammar registry
//!
//! Grammars are loaded the first time a document needs them. Every name is
//! attempted at most once: successes stay registered for the registry's
//! lifetime and failures are remembered so they are never retried.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::thread;

use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Parser, Query, QueryCursor};

use super::highlights::{flatten_spans, highlight_id_for_name, HighlightSpan};

/// Grammars compiled into the binary
pub const BUILTIN_GRAMMARS: &[&str] = &[
    "rust",
    "python",
    "javascript",
    "go",
    "c",
    "cpp",
    "java",
    "php",
    "bash",
    "scheme",
    "ini",
    "xml",
];

/// What a loader produces: a language and its highlights query source
pub struct GrammarModule {
    pub language: Language,
    pub highlights_query: &'static str,
}

/// Produces a grammar module, or `None` when it is unavailable
pub type GrammarLoader = Arc<dyn Fn() -> Option<GrammarModule> + Send + Sync>;

fn builtin_module(name: &str) -> Option<GrammarModule> {
    let (language, highlights_query): (Language, &'static str) = match name {
        "rust" => (
            tree_sitter_rust::LANGUAGE.into(),
            tree_sitter_rust::HIGHLIGHTS_QUERY,
        ),
        "python" => (
            tree_sitter_python::LANGUAGE.into(),
            tree_sitter_python::HIGHLIGHTS_QUERY,
        ),
        "javascript" => (
            tree_sitter_javascript::LANGUAGE.into(),
            tree_sitter_javascript::HIGHLIGHT_QUERY,
        ),
        "go" => (
            tree_sitter_go::LANGUAGE.into(),
            tree_sitter_go::HIGHLIGHTS_QUERY,
        ),
        "c" => (
            tree_sitter_c::LANGUAGE.into(),
            tree_sitter_c::HIGHLIGHT_QUERY,
        ),
        "cpp" => (
            tree_sitter_cpp::LANGUAGE.into(),
            tree_sitter_cpp::HIGHLIGHT_QUERY,
        ),
        "java" => (
            tree_sitter_java::LANGUAGE.into(),
            tree_sitter_java::HIGHLIGHTS_QUERY,
        ),
        "php" => (
            tree_sitter_php::LANGUAGE_PHP.into(),
            tree_sitter_php::HIGHLIGHTS_QUERY,
        ),
        "bash" => (
            tree_sitter_bash::LANGUAGE.into(),
            tree_sitter_bash::HIGHLIGHT_QUERY,
        ),
        "scheme" => (
            tree_sitter_racket::LANGUAGE.into(),
            tree_sitter_racket::HIGHLIGHTS_QUERY,
        ),
        "ini" => (
            tree_sitter_ini::LANGUAGE.into(),
            tree_sitter_ini::HIGHLIGHTS_QUERY,
        ),
        "xml" => (
            tree_sitter_xml::LANGUAGE_XML.into(),
            tree_sitter_xml::XML_HIGHLIGHT_QUERY,
        ),
        _ => return None,
    };
    Some(GrammarModule {
        language,
        highlights_query,
    })
}

/// A loaded grammar with its compiled highlights query
pub struct Grammar {
    name: String,
    language: Language,
    query: Query,
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("name", &self.name)
            .field("captures", &self.query.capture_names().len())
            .finish()
    }
}

impl Grammar {
    fn compile(name: &str, module: GrammarModule) -> Result<Self, String> {
        let query = Query::new(&module.language, module.highlights_query)
            .map_err(|e| format!("query compile failed: {:?}", e))?;
        Ok(Self {
            name: name.to_string(),
            language: module.language,
            query,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Highlight spans for `code`, disjoint and sorted by byte offset
    pub fn highlight(&self, code: &str) -> Vec<HighlightSpan> {
        let mut parser = Parser::new();
        if let Err(e) = parser.set_language(&self.language) {
            tracing::warn!("Failed to set language for {}: {}", self.name, e);
            return Vec::new();
        }
        let Some(tree) = parser.parse(code, None) else {
            return Vec::new();
        };

        let mut spans = Vec::new();
        let mut cursor = QueryCursor::new();
        let mut captures = cursor.captures(&self.query, tree.root_node(), code.as_bytes());
        while let Some((query_match, capture_idx)) = captures.next() {
            let capture = &query_match.captures[*capture_idx];
            let capture_name = &self.query.capture_names()[capture.index as usize];

            let Some(highlight) = highlight_id_for_name(capture_name) else {
                continue;
            };
            let range = capture.node.byte_range();
            if range.start < range.end {
                spans.push(HighlightSpan {
                    start: range.start,
                    end: range.end,
                    highlight,
                });
            }
        }

        flatten_spans(spans)
    }
}

pub struct GrammarRegistry {
    loaders: HashMap<String, GrammarLoader>,
    loaded: HashMap<String, Arc<Grammar>>,
    failed: HashSet<String>,
}

impl GrammarRegistry {
    /// Registry over the built-in grammars
    pub fn new() -> Self {
        Self::with_loaders(BUILTIN_GRAMMARS.iter().map(|&name| {
            let loader: GrammarLoader = Arc::new(move || builtin_module(name));
            (name.to_string(), loader)
        }))
    }

    /// Registry over custom loaders
    pub fn with_loaders(loaders: impl IntoIterator<Item = (String, GrammarLoader)>) -> Self {
        Self {
            loaders: loaders.into_iter().collect(),
            loaded: HashMap::new(),
            failed: HashSet::new(),
        }
    }

    /// Whether a loader exists for `name`
    pub fn is_registered(&self, name: &str) -> bool {
        self.loaders.contains_key(name)
    }

    /// Loaded grammar for `name`
    pub fn get(&self, name: &str) -> Option<Arc<Grammar>> {
        self.loaded.get(name).cloned()
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.loaded.contains_key(name)
    }

    /// Whether loading `name` was attempted and failed
    pub fn has_failed(&self, name: &str) -> bool {
        self.failed.contains(name)
    }

    /// Load every named grammar not yet attempted, in parallel.
    ///
    /// Returns how many were newly registered.
    pub fn ensure_loaded<S: AsRef<str>>(&mut self, names: &[S]) -> usize {
        let mut pending: Vec<(String, GrammarLoader)> = Vec::new();
        for name in names {
            let name: &str = name.as_ref();
            if self.loaded.contains_key(name)
                || self.failed.contains(name)
                || pending.iter().any(|(n, _)| n == name)
            {
                continue;
            }
            match self.loaders.get(name) {
                Some(loader) => pending.push((name.to_string(), Arc::clone(loader))),
                None => {
                    tracing::trace!(grammar = name, "No grammar registered");
                    self.failed.insert(name.to_string());
                }
            }
        }

        if pending.is_empty() {
            return 0;
        }

        let results: Vec<(String, Result<Grammar, String>)> = thread::scope(|scope| {
            let handles: Vec<_> = pending
                .iter()
                .map(|(name, loader)| {
                    let handle = scope.spawn(move || match loader() {
                        Some(module) => Grammar::compile(name, module),
                        None => Err("loader returned nothing".to_string()),
                    });
                    (name.clone(), handle)
                })
                .collect();

            handles
                .into_iter()
                .map(|(name, handle)| {
                    let result = handle
                        .join()
                        .unwrap_or_else(|_| Err("loader panicked".to_string()));
                    (name, result)
                })
                .collect()
        });

        let mut registered = 0;
        for (name, result) in results {
            match result {
                Ok(grammar) => {
                    tracing::debug!(grammar = %name, "Registered grammar");
                    self.loaded.insert(name, Arc::new(grammar));
                    registered += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to load grammar {}: {}", name, e);
                    self.failed.insert(name);
                }
            }
        }
        registered
    }
}

impl Default for GrammarRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_builtin_queries_compile() {
        let mut registry = GrammarRegistry::new();
        let loaded = registry.ensure_loaded(BUILTIN_GRAMMARS);
        for name in BUILTIN_GRAMMARS {
            assert!(registry.is_loaded(name), "{} failed to load", name);
        }
        assert_eq!(loaded, BUILTIN_GRAMMARS.len());
    }

    #[test]
    fn test_unknown_grammar_is_remembered_as_failed() {
        let mut registry = GrammarRegistry::new();
        assert!(!registry.is_registered("brainfuck"));
        assert_eq!(registry.ensure_loaded(&["brainfuck"]), 0);
        assert!(registry.has_failed("brainfuck"));
        assert!(registry.get("brainfuck").is_none());
    }

    #[test]
    fn test_rust_highlight_spans() {
        let mut registry = GrammarRegistry::new();
        registry.ensure_loaded(&["rust"]);
        let grammar = registry.get("rust").unwrap();

        let code = "fn main() { let x = 42; }";
        let spans = grammar.highlight(code);
        assert!(!spans.is_empty());

        let keyword = highlight_id_for_name("keyword").unwrap();
        let fn_kw = highlight_id_for_name("keyword.function");
        assert!(spans
            .iter()
            .any(|s| &code[s.start..s.end] == "fn"
                && (Some(s.highlight) == fn_kw || s.highlight == keyword)));
        assert!(spans.windows(2).all(|w| w[0].end <= w[1].start));
    }

    #[test]
    fn test_bad_query_fails_without_retry() {
        let loader: GrammarLoader = Arc::new(|| {
            Some(GrammarModule {
                language: tree_sitter_rust::LANGUAGE.into(),
                highlights_query: "((unclosed",
            })
        });
        let mut registry = GrammarRegistry::with_loaders([("broken".to_string(), loader)]);

        assert_eq!(registry.ensure_loaded(&["broken"]), 0);
        assert!(registry.has_failed("broken"));
        assert_eq!(registry.ensure_loaded(&["broken"]), 0);
    }
}
