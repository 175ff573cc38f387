//! Syntax highlighting module
//!
//! Highlights fenced code blocks of the rendered preview with tree-sitter:
//! - Fence tokens are normalized and resolved to a grammar name
//! - Grammars load lazily, in parallel, at most once per name
//! - Highlighted HTML is cached per (grammar, code)
//!
//! ## Architecture
//!
//! ```text
//! render_preview() → Highlighter::highlight_all(tree)
//!                  → resolve_grammar(language-*) → GrammarRegistry::ensure_loaded
//!                  → Grammar::highlight(code) → <span class="hl-…">
//! ```

mod highlighter;
mod highlights;
mod languages;
mod registry;

pub use highlighter::{HighlightReport, Highlighter};
pub use highlights::{
    css_class, highlight_id_for_name, HighlightId, HighlightSpan, HIGHLIGHT_NAMES,
};
pub use languages::{language_token, normalize_alias, resolve_grammar};
pub use registry::{Grammar, GrammarLoader, GrammarModule, GrammarRegistry, BUILTIN_GRAMMARS};
