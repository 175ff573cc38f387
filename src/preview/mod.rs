//! Markdown preview module
//!
//! Renders the document into a [`PreviewTree`] on every change, highlights
//! its code blocks, and exposes the element layout the scroll synchronizer
//! works against.

mod pane;
mod renderer;
mod toc;
mod tree;

pub use pane::PreviewPane;
pub use renderer::render_preview;
pub use toc::{extract_headings, scroll_to_heading, TocEntry};
pub use tree::{CodeBlock, PreviewNode, PreviewTree};
