//! The canonical markdown document
//!
//! [`ContentStore`] is the interface every other component consumes: the
//! persistence channel reads snapshots from it, the preview pane re-renders
//! when it changes, and scroll sync asks it to scroll the source view.
//! [`Document`] is the rope-backed implementation used by the bundled hosts.
//!
//! Everything here is single-threaded: components share the document through
//! `Rc<dyn ContentStore>` and all methods take `&self`.

use std::cell::{Cell, RefCell};
use std::ops::Range;
use std::rc::Rc;

use ropey::Rope;

use crate::sync::{SourceLine, SourceView};

/// Subscriber invoked with the full document text after every committed change
pub type ContentCallback = Box<dyn Fn(&str)>;

/// Owner of the document text
pub trait ContentStore {
    /// Current document text
    fn get_content(&self) -> String;

    /// Replace the whole document and notify subscribers
    fn set_content(&self, content: &str);

    /// Register a change subscriber (multi-subscriber, fired on every commit)
    fn on_content_changed(&self, callback: ContentCallback);

    /// Scroll the source view so the 1-based `line` sits near the top.
    /// Lines past the end clamp to the last line; `0` is ignored.
    fn scroll_to_line(&self, line: usize);
}

/// Visible window of the source view, in lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// First visible line (0-indexed)
    pub top_line: usize,
    /// Number of lines that fit on screen
    pub visible_lines: usize,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            top_line: 0,
            visible_lines: 40,
        }
    }
}

/// Rope-backed document with a line-addressable viewport
pub struct Document {
    buffer: RefCell<Rope>,
    revision: Cell<u64>,
    viewport: Cell<Viewport>,
    /// Lines kept above a line targeted by `scroll_to_line`
    scroll_margin: usize,
    subscribers: RefCell<Vec<Rc<dyn Fn(&str)>>>,
}

impl Document {
    pub fn new(text: &str) -> Self {
        Self {
            buffer: RefCell::new(Rope::from_str(text)),
            revision: Cell::new(0),
            viewport: Cell::new(Viewport::default()),
            scroll_margin: 1,
            subscribers: RefCell::new(Vec::new()),
        }
    }

    pub fn with_scroll_margin(mut self, lines: usize) -> Self {
        self.scroll_margin = lines;
        self
    }

    /// Incremented on every committed change
    pub fn revision(&self) -> u64 {
        self.revision.get()
    }

    /// Number of lines, counting a trailing empty line after a final newline
    pub fn line_count(&self) -> usize {
        self.buffer.borrow().len_lines()
    }

    /// Text of a 1-based line without its line ending
    pub fn line_text(&self, line_number: usize) -> Option<String> {
        let buffer = self.buffer.borrow();
        if line_number == 0 || line_number > buffer.len_lines() {
            return None;
        }
        let line = buffer.line(line_number - 1).to_string();
        Some(line.trim_end_matches(['\n', '\r']).to_string())
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport.get()
    }

    /// Move the top of the viewport (0-indexed), clamped to the document
    pub fn set_top_line(&self, top_line: usize) {
        let max_top = self.line_count().saturating_sub(1);
        let mut viewport = self.viewport.get();
        viewport.top_line = top_line.min(max_top);
        self.viewport.set(viewport);
    }

    /// Insert text at a char index (clamped to the end of the document)
    pub fn insert(&self, char_idx: usize, text: &str) {
        if text.is_empty() {
            return;
        }
        {
            let mut buffer = self.buffer.borrow_mut();
            let idx = char_idx.min(buffer.len_chars());
            buffer.insert(idx, text);
        }
        self.commit();
    }

    /// Remove a char range (clamped to the document)
    pub fn remove(&self, range: Range<usize>) {
        {
            let mut buffer = self.buffer.borrow_mut();
            let end = range.end.min(buffer.len_chars());
            let start = range.start.min(end);
            if start == end {
                return;
            }
            buffer.remove(start..end);
        }
        self.commit();
    }

    fn commit(&self) {
        self.revision.set(self.revision.get() + 1);

        // Keep the viewport inside the (possibly shorter) document
        self.set_top_line(self.viewport.get().top_line);

        let subscribers: Vec<Rc<dyn Fn(&str)>> = self.subscribers.borrow().clone();
        if subscribers.is_empty() {
            return;
        }
        let text = self.buffer.borrow().to_string();
        tracing::trace!(
            revision = self.revision.get(),
            subscribers = subscribers.len(),
            "Notifying content subscribers"
        );
        for subscriber in subscribers {
            subscriber(&text);
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("")
    }
}

impl ContentStore for Document {
    fn get_content(&self) -> String {
        self.buffer.borrow().to_string()
    }

    fn set_content(&self, content: &str) {
        *self.buffer.borrow_mut() = Rope::from_str(content);
        self.commit();
    }

    fn on_content_changed(&self, callback: ContentCallback) {
        self.subscribers.borrow_mut().push(Rc::from(callback));
    }

    fn scroll_to_line(&self, line: usize) {
        if line == 0 {
            return;
        }
        let target = line.min(self.line_count()) - 1;
        let top = target.saturating_sub(self.scroll_margin);
        tracing::debug!(line, top_line = top, "Scrolling source view to line");
        self.set_top_line(top);
    }
}

impl SourceView for Document {
    fn top_visible_line(&self) -> Option<SourceLine> {
        let number = self.viewport.get().top_line + 1;
        let text = self.line_text(number)?;
        Some(SourceLine { number, text })
    }
}
