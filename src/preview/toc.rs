//! Table of contents from the rendered headings

use super::tree::PreviewTree;
use crate::document::ContentStore;
use crate::sync::PreviewView;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    /// The heading's `id` in the rendered HTML
    pub id: String,
    pub level: u8,
    pub text: String,
    /// 1-based source line of the heading
    pub line: usize,
    /// Index of the heading among the preview elements
    pub node: usize,
}

/// Headings in document order; headings without text are skipped
pub fn extract_headings(tree: &PreviewTree) -> Vec<TocEntry> {
    tree.headings()
        .filter_map(|(node_index, level, node)| {
            let text = node.text.trim();
            if text.is_empty() {
                return None;
            }
            Some(TocEntry {
                id: node.anchor.clone()?,
                level,
                text: text.to_string(),
                line: node.start_line,
                node: node_index,
            })
        })
        .collect()
}

/// Bring a heading to the top of both the source and the preview
pub fn scroll_to_heading(entry: &TocEntry, content: &dyn ContentStore, preview: &dyn PreviewView) {
    tracing::debug!(id = %entry.id, line = entry.line, "Scrolling to heading");
    content.scroll_to_line(entry.line);
    preview.scroll_element_into_view(entry.node);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PreviewConfig;
    use crate::document::Document;
    use crate::preview::{render_preview, PreviewPane};
    use crate::syntax::Highlighter;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_extract_headings() {
        let tree = render_preview("# Intro\n\ntext\n\n## Getting Started\n\n#\n\n## Intro\n");
        let toc = extract_headings(&tree);

        let ids: Vec<_> = toc.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["h-0-intro", "h-1-getting-started", "h-3-intro"]);
        assert_eq!(toc[1].level, 2);
        assert_eq!(toc[1].line, 5);
    }

    #[test]
    fn test_toc_ids_link_to_rendered_headings() {
        let tree = render_preview("# Intro\n\ntext\n\n## Setup {#install}\n");
        let html = tree.to_html();
        for entry in extract_headings(&tree) {
            assert!(
                html.contains(&format!("id=\"{}\"", entry.id)),
                "{} missing from {}",
                entry.id,
                html
            );
        }
        assert!(html.contains("id=\"h-0-intro\""));
    }

    #[test]
    fn test_scroll_to_heading_moves_both_views() {
        let text = "# Top\n\n".to_string() + &"filler\n\n".repeat(10) + "## Target\n\nbody\n";
        let doc = Document::new(&text);
        let pane = Rc::new(PreviewPane::new(
            &PreviewConfig::default(),
            Rc::new(RefCell::new(Highlighter::new())),
        ));
        PreviewPane::attach(&pane, &doc);

        let toc = extract_headings(&pane.tree());
        let target = toc.iter().find(|e| e.text == "Target").unwrap();
        assert_eq!(target.line, 23);

        scroll_to_heading(target, &doc, pane.as_ref());
        assert_eq!(doc.viewport().top_line, 21);
        assert_eq!(pane.scroll_offset(), 22.0 * 20.0);
    }
}
