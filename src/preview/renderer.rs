//! Markdown to preview tree using pulldown-cmark

use pulldown_cmark::{html, CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use super::tree::{code_placeholder, CodeBlock, PreviewNode, PreviewTree};
use crate::sync::ElementKind;
use crate::util::text::slugify;

/// Byte offset -> 1-based line lookups
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    fn line_of(&self, offset: usize) -> usize {
        self.starts.partition_point(|&start| start <= offset).max(1)
    }

    /// Inclusive line span of a byte range
    fn span(&self, range: &std::ops::Range<usize>) -> (usize, usize) {
        let start = self.line_of(range.start);
        let end = if range.end > range.start {
            self.line_of(range.end - 1)
        } else {
            start
        };
        (start, end)
    }
}

#[derive(Default)]
struct TreeBuilder {
    nodes: Vec<PreviewNode>,
    code_blocks: Vec<CodeBlock>,
    /// Indices of currently open nodes, outermost first
    open: Vec<usize>,
    /// Inside a code block: text goes to the block, not the HTML stream
    in_code_block: bool,
}

impl TreeBuilder {
    fn push(&mut self, kind: ElementKind, (start_line, end_line): (usize, usize)) -> usize {
        let index = self.nodes.len();
        self.nodes.push(PreviewNode {
            kind,
            text: String::new(),
            start_line,
            end_line,
            code_block: None,
            anchor: None,
        });
        index
    }

    fn open(&mut self, kind: ElementKind, span: (usize, usize)) -> usize {
        let index = self.push(kind, span);
        self.open.push(index);
        index
    }

    fn close(&mut self) {
        self.open.pop();
    }

    /// Append to every open node, like DOM `textContent`
    fn append_text(&mut self, text: &str) {
        for &index in &self.open {
            self.nodes[index].text.push_str(text);
        }
        if self.in_code_block {
            if let Some(block) = self.code_blocks.last_mut() {
                block.code.push_str(text);
            }
        }
    }

    fn open_code_block(&mut self, kind: &CodeBlockKind<'_>, span: (usize, usize)) {
        let classes = match kind {
            CodeBlockKind::Fenced(info) => info
                .split_whitespace()
                .next()
                .map(|lang| vec![format!("language-{}", lang)])
                .unwrap_or_default(),
            CodeBlockKind::Indented => Vec::new(),
        };

        self.open(ElementKind::Pre, span);
        let code = self.open(ElementKind::Code, span);
        self.nodes[code].code_block = Some(self.code_blocks.len());
        self.code_blocks.push(CodeBlock {
            classes,
            code: String::new(),
            highlighted: None,
        });
        self.in_code_block = true;
    }

    fn close_code_block(&mut self) -> usize {
        self.close();
        self.close();
        self.in_code_block = false;
        self.code_blocks.len() - 1
    }
}

fn line_marker(line: usize) -> Event<'static> {
    Event::Html(format!(r#"<span data-line="{}"></span>"#, line).into())
}

/// Give a heading without `{#id}` the anchor `h-<ordinal>-<slug>`.
/// Headings without text stay unnamed.
fn name_heading(start: &mut Event<'_>, node: &mut PreviewNode, ordinal: usize) {
    let text = node.text.trim();
    if text.is_empty() {
        return;
    }
    let anchor = format!("h-{}-{}", ordinal, slugify(text));

    if let Event::Start(Tag::Heading { id, .. }) = start {
        *id = Some(anchor.clone().into());
    }
    node.anchor = Some(anchor);
}

/// Render markdown to a preview tree.
///
/// Enables tables, footnotes, strikethrough, task lists and heading
/// attributes (`# Title {#id}`).
pub fn render_preview(markdown: &str) -> PreviewTree {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_HEADING_ATTRIBUTES;

    let lines = LineIndex::new(markdown);
    let mut builder = TreeBuilder::default();
    let mut events: Vec<Event<'_>> = Vec::new();
    let mut heading_count = 0;
    // (event position, node, ordinal) of an open heading that needs an id
    let mut unnamed_heading: Option<(usize, usize, usize)> = None;

    for (event, range) in Parser::new_ext(markdown, options).into_offset_iter() {
        let span = lines.span(&range);

        match &event {
            Event::Start(Tag::Heading { level, id, .. }) => {
                let node = builder.open(ElementKind::Heading(*level as u8), span);
                match id {
                    Some(id) => builder.nodes[node].anchor = Some(id.to_string()),
                    None => unnamed_heading = Some((events.len() + 1, node, heading_count)),
                }
                heading_count += 1;
                events.push(line_marker(span.0));
                events.push(event);
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((position, node, ordinal)) = unnamed_heading.take() {
                    name_heading(&mut events[position], &mut builder.nodes[node], ordinal);
                }
                builder.close();
                events.push(event);
            }
            Event::Start(Tag::Paragraph) => {
                builder.open(ElementKind::Paragraph, span);
                events.push(line_marker(span.0));
                events.push(event);
            }
            Event::Start(Tag::BlockQuote(_)) => {
                builder.open(ElementKind::BlockQuote, span);
                events.push(line_marker(span.0));
                events.push(event);
            }
            Event::Start(Tag::Item) => {
                builder.open(ElementKind::ListItem, span);
                events.push(event);
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                builder.open_code_block(kind, span);
                events.push(line_marker(span.0));
            }
            Event::End(TagEnd::CodeBlock) => {
                let index = builder.close_code_block();
                events.push(Event::Html(
                    format!("<pre>{}</pre>\n", code_placeholder(index)).into(),
                ));
            }
            Event::End(TagEnd::Paragraph | TagEnd::BlockQuote(_) | TagEnd::Item) => {
                builder.close();
                events.push(event);
            }
            Event::Text(text) => {
                builder.append_text(text);
                if !builder.in_code_block {
                    events.push(event);
                }
            }
            Event::Code(code) => {
                // Inline code is its own `code` element
                let index = builder.push(ElementKind::Code, span);
                builder.nodes[index].text.push_str(code);
                builder.append_text(code);
                events.push(event);
            }
            Event::SoftBreak | Event::HardBreak => {
                builder.append_text("\n");
                events.push(event);
            }
            _ => {
                if !builder.in_code_block {
                    events.push(event);
                }
            }
        }
    }

    let mut body = String::new();
    html::push_html(&mut body, events.into_iter());

    tracing::trace!(
        nodes = builder.nodes.len(),
        code_blocks = builder.code_blocks.len(),
        "Rendered preview"
    );
    PreviewTree::new(body, builder.nodes, builder.code_blocks)
}
