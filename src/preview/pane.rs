//! Markdown preview pane state
//!
//! Holds the latest rendered tree and an estimated vertical layout: every
//! element occupies its source line span at a fixed line height, which is all
//! the scroll synchronizer needs to pick the element at the top of the view.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Instant;

use super::renderer::render_preview;
use super::tree::PreviewTree;
use crate::config::PreviewConfig;
use crate::document::ContentStore;
use crate::perf::LatencyProfiler;
use crate::sync::{ElementRect, PreviewElement, PreviewView};
use crate::syntax::{HighlightReport, Highlighter};

pub struct PreviewPane {
    tree: RefCell<PreviewTree>,
    highlighter: Rc<RefCell<Highlighter>>,
    profiler: RefCell<LatencyProfiler>,
    /// Vertical scroll position in pixels
    scroll_offset: Cell<f32>,
    line_height: f32,
    inner_scroller: bool,
    render_count: Cell<u64>,
    last_report: Cell<HighlightReport>,
}

impl PreviewPane {
    pub fn new(config: &PreviewConfig, highlighter: Rc<RefCell<Highlighter>>) -> Self {
        Self {
            tree: RefCell::new(PreviewTree::default()),
            highlighter,
            profiler: RefCell::new(LatencyProfiler::new()),
            scroll_offset: Cell::new(0.0),
            line_height: config.line_height.max(1.0),
            inner_scroller: false,
            render_count: Cell::new(0),
            last_report: Cell::new(HighlightReport::default()),
        }
    }

    /// Report an inner scrollable content element in addition to the container
    pub fn with_inner_scroller(mut self, inner: bool) -> Self {
        self.inner_scroller = inner;
        self
    }

    /// Render the current content and re-render on every change.
    ///
    /// Each change counts as an input for the latency profiler.
    pub fn attach(pane: &Rc<PreviewPane>, content: &dyn ContentStore) {
        pane.render(&content.get_content());

        let weak = Rc::downgrade(pane);
        content.on_content_changed(Box::new(move |text: &str| {
            if let Some(pane) = weak.upgrade() {
                pane.mark_input(Instant::now());
                pane.render(text);
            }
        }));
    }

    /// Rebuild the tree from scratch and highlight its code blocks
    pub fn render(&self, markdown: &str) {
        let mut tree = render_preview(markdown);
        let report = self.highlighter.borrow_mut().highlight_all(&mut tree);
        *self.tree.borrow_mut() = tree;

        self.last_report.set(report);
        self.render_count.set(self.render_count.get() + 1);
        self.profiler
            .borrow_mut()
            .record_render_complete(Instant::now());
    }

    /// Mark the arrival of an edit for latency tracking
    pub fn mark_input(&self, now: Instant) {
        self.profiler.borrow_mut().mark_input(now);
    }

    pub fn profiler(&self) -> std::cell::Ref<'_, LatencyProfiler> {
        self.profiler.borrow()
    }

    pub fn tree(&self) -> std::cell::Ref<'_, PreviewTree> {
        self.tree.borrow()
    }

    pub fn html(&self) -> String {
        self.tree.borrow().to_html()
    }

    pub fn render_count(&self) -> u64 {
        self.render_count.get()
    }

    pub fn last_highlight_report(&self) -> HighlightReport {
        self.last_report.get()
    }

    pub fn scroll_offset(&self) -> f32 {
        self.scroll_offset.get()
    }

    pub fn set_scroll_offset(&self, offset: f32) {
        self.scroll_offset.set(offset.max(0.0));
    }

    /// Scroll so the given 1-based source line is at the top
    pub fn scroll_to_source_line(&self, line: usize) {
        self.set_scroll_offset(line.saturating_sub(1) as f32 * self.line_height);
    }
}

impl PreviewView for PreviewPane {
    fn has_content(&self) -> bool {
        !self.tree.borrow().is_empty()
    }

    fn has_inner_scroller(&self) -> bool {
        self.inner_scroller
    }

    fn container_top(&self) -> f32 {
        0.0
    }

    fn elements(&self) -> Vec<PreviewElement> {
        let offset = self.scroll_offset.get();
        self.tree
            .borrow()
            .nodes()
            .iter()
            .enumerate()
            .map(|(index, node)| PreviewElement {
                index,
                kind: node.kind,
                text: node.text.clone(),
                rect: ElementRect {
                    top: node.start_line.saturating_sub(1) as f32 * self.line_height - offset,
                    bottom: node.end_line as f32 * self.line_height - offset,
                },
            })
            .collect()
    }

    fn scroll_element_into_view(&self, index: usize) {
        let line = self.tree.borrow().nodes().get(index).map(|n| n.start_line);
        match line {
            Some(line) => self.scroll_to_source_line(line),
            None => tracing::trace!(index, "Scroll target no longer exists"),
        }
    }
}
