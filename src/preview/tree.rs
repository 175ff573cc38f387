//! Rendered preview tree
//!
//! The renderer produces the preview HTML once, with each fenced code block
//! replaced by a placeholder, plus a flat list of the block elements in
//! document order. Code blocks stay editable (classes and highlighted markup)
//! until [`PreviewTree::to_html`] splices them back in.

use crate::sync::ElementKind;
use crate::util::text::escape_html;

/// A heading or block element of the preview
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewNode {
    pub kind: ElementKind,
    /// Concatenated descendant text
    pub text: String,
    /// First source line (1-based)
    pub start_line: usize,
    /// Last source line (1-based, inclusive)
    pub end_line: usize,
    /// Index into [`PreviewTree::code_blocks`] for `pre > code` elements
    pub code_block: Option<usize>,
    /// `id` attribute of a heading: `{#id}` when given, else `h-<n>-<slug>`
    pub anchor: Option<String>,
}

/// A fenced or indented code block (`pre > code`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Classes of the `code` element, e.g. `language-rust`
    pub classes: Vec<String>,
    /// Raw code text
    pub code: String,
    /// Highlighted markup replacing the escaped code when present
    pub highlighted: Option<String>,
}

impl CodeBlock {
    fn to_html(&self) -> String {
        let body = match &self.highlighted {
            Some(html) => html.clone(),
            None => escape_html(&self.code),
        };
        if self.classes.is_empty() {
            format!("<code>{}</code>", body)
        } else {
            format!(
                "<code class=\"{}\">{}</code>",
                escape_html(&self.classes.join(" ")),
                body
            )
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewTree {
    body: String,
    nodes: Vec<PreviewNode>,
    code_blocks: Vec<CodeBlock>,
}

pub(crate) fn code_placeholder(index: usize) -> String {
    format!("<!--markon-code:{}-->", index)
}

impl PreviewTree {
    pub(crate) fn new(body: String, nodes: Vec<PreviewNode>, code_blocks: Vec<CodeBlock>) -> Self {
        Self {
            body,
            nodes,
            code_blocks,
        }
    }

    /// Nothing was rendered
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.body.trim().is_empty()
    }

    /// Heading and block elements in document order
    pub fn nodes(&self) -> &[PreviewNode] {
        &self.nodes
    }

    pub fn code_blocks(&self) -> &[CodeBlock] {
        &self.code_blocks
    }

    pub fn code_blocks_mut(&mut self) -> &mut [CodeBlock] {
        &mut self.code_blocks
    }

    /// Heading nodes with their node index and level
    pub fn headings(&self) -> impl Iterator<Item = (usize, u8, &PreviewNode)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(index, node)| match node.kind {
                ElementKind::Heading(level) => Some((index, level, node)),
                _ => None,
            })
    }

    /// HTML fragment with code blocks spliced in
    pub fn to_html(&self) -> String {
        let mut html = self.body.clone();
        for (index, block) in self.code_blocks.iter().enumerate() {
            html = html.replacen(&code_placeholder(index), &block.to_html(), 1);
        }
        html
    }
}
