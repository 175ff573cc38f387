//! markon - core of a distraction-free markdown editor
//!
//! This crate provides the pieces a host shell wires together: the document
//! store, a rendered preview with lazily highlighted code blocks, background
//! persistence, and bidirectional scroll sync between source and preview.

pub mod boot;
pub mod cli;
pub mod config;
pub mod config_paths;
pub mod document;
pub mod perf;
pub mod preview;
pub mod storage;
pub mod sync;
pub mod syntax;
pub mod tracing;
pub mod util;

// Re-export commonly used types
pub use config::EditorConfig;
pub use document::{ContentStore, Document};
pub use preview::PreviewPane;
pub use storage::PersistenceChannel;
pub use sync::ScrollSync;
pub use syntax::Highlighter;
