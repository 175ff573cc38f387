//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use markon::storage::{TransportError, WorkerRequest, WorkerResponse, WorkerTransport};
use markon::sync::{ElementKind, ElementRect, PreviewElement, PreviewView};

/// Transport that records every request and replays queued responses
#[derive(Clone, Default)]
pub struct RecordingTransport {
    pub sent: Rc<RefCell<Vec<WorkerRequest>>>,
    pub inbox: Rc<RefCell<VecDeque<WorkerResponse>>>,
    pub terminated: Rc<Cell<bool>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, content: &str) {
        self.inbox
            .borrow_mut()
            .push_back(WorkerResponse::ContentLoaded {
                content: content.to_string(),
            });
    }

    pub fn flushes(&self) -> Vec<String> {
        self.sent
            .borrow()
            .iter()
            .filter_map(|request| match request {
                WorkerRequest::FlushNow { content } => Some(content.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.sent.borrow().iter().map(|r| r.kind()).collect()
    }
}

impl WorkerTransport for RecordingTransport {
    fn post(&self, request: WorkerRequest) -> Result<(), TransportError> {
        if self.terminated.get() {
            return Err(TransportError::Disconnected);
        }
        self.sent.borrow_mut().push(request);
        Ok(())
    }

    fn try_recv(&self) -> Option<WorkerResponse> {
        self.inbox.borrow_mut().pop_front()
    }

    fn recv_timeout(&self, _timeout: Duration) -> Option<WorkerResponse> {
        self.try_recv()
    }

    fn terminate(&mut self) {
        self.terminated.set(true);
    }
}

/// Preview with fixed elements that records scroll requests
pub struct FakePreview {
    pub elements: RefCell<Vec<PreviewElement>>,
    pub inner_scroller: bool,
    pub scrolled: RefCell<Vec<usize>>,
}

impl FakePreview {
    /// Elements stacked 20px apart, in the given order
    pub fn stacked(items: &[(ElementKind, &str)]) -> Rc<Self> {
        let elements = items
            .iter()
            .enumerate()
            .map(|(index, (kind, text))| element(index, *kind, text, index as f32 * 20.0))
            .collect();
        Rc::new(Self {
            elements: RefCell::new(elements),
            inner_scroller: false,
            scrolled: RefCell::new(Vec::new()),
        })
    }

    /// Shift every element up by `offset` pixels
    pub fn scroll_by(&self, offset: f32) {
        for element in self.elements.borrow_mut().iter_mut() {
            element.rect.top -= offset;
            element.rect.bottom -= offset;
        }
    }
}

impl PreviewView for FakePreview {
    fn has_content(&self) -> bool {
        !self.elements.borrow().is_empty()
    }

    fn has_inner_scroller(&self) -> bool {
        self.inner_scroller
    }

    fn container_top(&self) -> f32 {
        0.0
    }

    fn elements(&self) -> Vec<PreviewElement> {
        self.elements.borrow().clone()
    }

    fn scroll_element_into_view(&self, index: usize) {
        self.scrolled.borrow_mut().push(index);
    }
}

pub fn element(index: usize, kind: ElementKind, text: &str, top: f32) -> PreviewElement {
    PreviewElement {
        index,
        kind,
        text: text.to_string(),
        rect: ElementRect {
            top,
            bottom: top + 18.0,
        },
    }
}

/// Markdown with a level-3 heading on line 12
pub fn doc_with_section_at_line_12() -> String {
    let mut text = String::from("# Title\n\n");
    for i in 3..=10 {
        text.push_str(&format!("filler paragraph {}\n", i));
    }
    text.push('\n');
    text.push_str("### My Section\n\nSection body\n");
    text
}

/// Tiny deterministic generator for interleaving tests
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    pub fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }
}
