//! Bidirectional scroll synchronization between source and preview
//!
//! Scrolling either surface brings the other to the corresponding content.
//! Each direction runs its own [`DirectionState`] machine; the host feeds it
//! scroll events, timer ticks and animation frames with explicit instants:
//!
//! ```text
//! handle_scroll(target, now)   -> Pending(now + debounce)
//! tick(now)                    -> AwaitingFrame (guard passed) / Idle
//! animation_frame(now)         -> Settling(now + settle) / Idle
//! tick(now)                    -> Idle once settled
//! ```
//!
//! While a direction is in flight every incoming scroll event is dropped, which
//! is what keeps a sync from bouncing back as a sync in the other direction.

mod matching;
mod state;

pub use matching::{
    find_element_in_preview, find_heading_in_markdown, find_line_in_markdown, normalize,
    resolve_source_line, texts_correspond, visible_element, VisibleElement,
};
pub use state::{DirectionState, TickOutcome};

use std::rc::Rc;
use std::time::Instant;

use crate::config::SyncConfig;
use crate::document::ContentStore;

/// A source line as seen at the top of the source viewport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// 1-based line number
    pub number: usize,
    pub text: String,
}

/// The editable source surface
pub trait SourceView {
    /// Line under the viewport's top-left corner
    fn top_visible_line(&self) -> Option<SourceLine>;
}

/// Block-level element kinds the synchronizer matches against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// `h1`..`h6`
    Heading(u8),
    Paragraph,
    ListItem,
    Code,
    Pre,
    BlockQuote,
}

impl ElementKind {
    pub fn is_heading(&self) -> bool {
        matches!(self, Self::Heading(_))
    }
}

/// Vertical extent of an element, in the same coordinate space as
/// [`PreviewView::container_top`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementRect {
    pub top: f32,
    pub bottom: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewElement {
    /// Stable index usable with [`PreviewView::scroll_element_into_view`]
    pub index: usize,
    pub kind: ElementKind,
    /// Concatenated descendant text
    pub text: String,
    pub rect: ElementRect,
}

/// The rendered preview surface
pub trait PreviewView {
    /// Whether anything has been rendered yet
    fn has_content(&self) -> bool;

    /// Whether the preview scrolls an inner content element as well as its container
    fn has_inner_scroller(&self) -> bool;

    /// Top edge of the visible container
    fn container_top(&self) -> f32;

    /// Headings and block elements in document order
    fn elements(&self) -> Vec<PreviewElement>;

    /// Smoothly scroll so the element's top aligns with the container's top
    fn scroll_element_into_view(&self, index: usize);
}

/// Surfaces that can emit scroll events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrollTarget {
    Source,
    PreviewContainer,
    PreviewContent,
}

/// Sync direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    SourceToPreview,
    PreviewToSource,
}

impl ScrollTarget {
    pub fn direction(&self) -> Direction {
        match self {
            Self::Source => Direction::SourceToPreview,
            Self::PreviewContainer | Self::PreviewContent => Direction::PreviewToSource,
        }
    }
}

/// A scroll performed during an animation frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    /// Preview element scrolled into view to follow source line `line`
    PreviewScrolled { element: usize, line: usize },
    /// Source scrolled to `line` to follow preview element `element`
    SourceScrolled { line: usize, element: usize },
}

pub struct ScrollSync {
    source: Rc<dyn SourceView>,
    preview: Rc<dyn PreviewView>,
    content: Rc<dyn ContentStore>,
    config: SyncConfig,
    enabled: bool,
    listeners: Vec<ScrollTarget>,
    source_to_preview: DirectionState,
    preview_to_source: DirectionState,
}

impl ScrollSync {
    pub fn new(
        source: Rc<dyn SourceView>,
        preview: Rc<dyn PreviewView>,
        content: Rc<dyn ContentStore>,
        config: SyncConfig,
    ) -> Self {
        Self {
            source,
            preview,
            content,
            config,
            enabled: false,
            listeners: Vec::new(),
            source_to_preview: DirectionState::Idle,
            preview_to_source: DirectionState::Idle,
        }
    }

    /// Attach scroll listeners. Calling this twice attaches nothing new.
    pub fn enable(&mut self) {
        if self.enabled {
            return;
        }
        self.enabled = true;

        self.attach(ScrollTarget::Source);
        self.attach(ScrollTarget::PreviewContainer);
        if self.preview.has_inner_scroller() {
            self.attach(ScrollTarget::PreviewContent);
        }
        tracing::debug!(listeners = self.listeners.len(), "Scroll sync enabled");
    }

    /// Detach every listener and cancel pending work
    pub fn disable(&mut self) {
        if !self.enabled && self.listeners.is_empty() {
            return;
        }
        self.enabled = false;
        self.listeners.clear();
        self.source_to_preview.reset();
        self.preview_to_source.reset();
        tracing::debug!("Scroll sync disabled");
    }

    fn attach(&mut self, target: ScrollTarget) {
        if !self.listeners.contains(&target) {
            self.listeners.push(target);
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Currently attached scroll targets
    pub fn listeners(&self) -> &[ScrollTarget] {
        &self.listeners
    }

    /// A source-to-preview sync is in flight
    pub fn syncing_source(&self) -> bool {
        self.source_to_preview.is_in_flight()
    }

    /// A preview-to-source sync is in flight
    pub fn syncing_preview(&self) -> bool {
        self.preview_to_source.is_in_flight()
    }

    pub fn state(&self, direction: Direction) -> DirectionState {
        match direction {
            Direction::SourceToPreview => self.source_to_preview,
            Direction::PreviewToSource => self.preview_to_source,
        }
    }

    fn state_mut(&mut self, direction: Direction) -> &mut DirectionState {
        match direction {
            Direction::SourceToPreview => &mut self.source_to_preview,
            Direction::PreviewToSource => &mut self.preview_to_source,
        }
    }

    fn in_flight(&self) -> bool {
        self.syncing_source() || self.syncing_preview()
    }

    /// Record a scroll event from `target`
    pub fn handle_scroll(&mut self, target: ScrollTarget, now: Instant) {
        if !self.listeners.contains(&target) {
            return;
        }
        if !self.enabled || self.in_flight() {
            tracing::trace!(?target, "Dropping scroll event during sync");
            return;
        }

        let debounce = self.config.debounce();
        self.state_mut(target.direction()).schedule(now, debounce);
    }

    /// Advance debounce and settle timers.
    ///
    /// Returns true when a direction is waiting for [`Self::animation_frame`].
    pub fn tick(&mut self, now: Instant) -> bool {
        let enabled = self.enabled;

        // Source first: if both fire together only one may go in flight
        let preview_busy = self.preview_to_source.is_in_flight();
        let outcome = self
            .source_to_preview
            .tick(now, || enabled && !preview_busy);
        if outcome == TickOutcome::Dropped {
            tracing::trace!("Source-to-preview sync dropped by guard");
        }

        let source_busy = self.source_to_preview.is_in_flight();
        let outcome = self
            .preview_to_source
            .tick(now, || enabled && !source_busy);
        if outcome == TickOutcome::Dropped {
            tracing::trace!("Preview-to-source sync dropped by guard");
        }

        self.frame_requested()
    }

    /// Whether a direction is waiting for the next animation frame
    pub fn frame_requested(&self) -> bool {
        self.source_to_preview == DirectionState::AwaitingFrame
            || self.preview_to_source == DirectionState::AwaitingFrame
    }

    /// Earliest instant at which [`Self::tick`] has work to do
    pub fn next_deadline(&self) -> Option<Instant> {
        match (
            self.source_to_preview.deadline(),
            self.preview_to_source.deadline(),
        ) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Run the deferred half of whichever direction awaits a frame
    pub fn animation_frame(&mut self, now: Instant) -> Option<SyncAction> {
        let direction = if self.source_to_preview == DirectionState::AwaitingFrame {
            Direction::SourceToPreview
        } else if self.preview_to_source == DirectionState::AwaitingFrame {
            Direction::PreviewToSource
        } else {
            return None;
        };

        let action = if self.enabled {
            match direction {
                Direction::SourceToPreview => self.scroll_preview_to_source_line(),
                Direction::PreviewToSource => self.scroll_source_to_preview_element(),
            }
        } else {
            None
        };

        let settle = self.config.settle();
        self.state_mut(direction)
            .finish_frame(now, action.is_some(), settle);
        action
    }

    /// Scroll the preview to the element matching the top source line
    fn scroll_preview_to_source_line(&self) -> Option<SyncAction> {
        let Some(line) = self.source.top_visible_line() else {
            tracing::trace!("No visible source line");
            return None;
        };
        if line.text.trim().is_empty() {
            tracing::trace!(line = line.number, "Top source line is blank");
            return None;
        }
        if !self.preview.has_content() {
            tracing::trace!("Preview has no content");
            return None;
        }

        let elements = self.preview.elements();
        let Some(index) = find_element_in_preview(&elements, &line.text) else {
            tracing::trace!(line = line.number, "No preview element matches source line");
            return None;
        };

        self.preview.scroll_element_into_view(index);
        tracing::debug!(line = line.number, element = index, "Synced preview to source");
        Some(SyncAction::PreviewScrolled {
            element: index,
            line: line.number,
        })
    }

    /// Scroll the source to the line matching the element at the preview probe
    fn scroll_source_to_preview_element(&self) -> Option<SyncAction> {
        let probe = self.preview.container_top() + self.config.probe_offset_px;
        let elements = self.preview.elements();
        let Some(visible) = visible_element(&elements, probe) else {
            tracing::trace!(probe, "No preview element near probe");
            return None;
        };

        let markdown = self.content.get_content();
        if markdown.is_empty() {
            tracing::trace!("Document is empty");
            return None;
        }

        let Some(line) = resolve_source_line(&markdown, &visible) else {
            tracing::trace!(element = visible.index, "No source line matches preview element");
            return None;
        };

        self.content.scroll_to_line(line);
        tracing::debug!(line, element = visible.index, "Synced source to preview");
        Some(SyncAction::SourceScrolled {
            line,
            element: visible.index,
        })
    }
}

impl Drop for ScrollSync {
    fn drop(&mut self) {
        self.disable();
    }
}
