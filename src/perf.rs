//! Input-to-preview latency tracking
//!
//! The host marks the instant an edit arrives; the preview pane records when
//! the re-render finishes. The last [`LATENCY_HISTORY_SIZE`] latencies are kept
//! for averaging.

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

pub const LATENCY_HISTORY_SIZE: usize = 20;

/// Frame-budget grade of a latency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyGrade {
    /// Under one 60Hz frame (16ms)
    Good,
    /// Under two frames (33ms)
    Ok,
    Bad,
}

impl LatencyGrade {
    pub fn from_duration(latency: Duration) -> Self {
        if latency < Duration::from_millis(16) {
            Self::Good
        } else if latency < Duration::from_millis(33) {
            Self::Ok
        } else {
            Self::Bad
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Ok => "ok",
            Self::Bad => "bad",
        }
    }
}

/// Snapshot for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencySummary {
    pub latest: Duration,
    pub average: Duration,
    pub samples: usize,
    pub grade: LatencyGrade,
}

impl fmt::Display for LatencySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "latency {:.1}ms (avg {:.1}ms over {}) [{}]",
            self.latest.as_secs_f64() * 1000.0,
            self.average.as_secs_f64() * 1000.0,
            self.samples,
            self.grade.label()
        )
    }
}

#[derive(Debug, Default)]
pub struct LatencyProfiler {
    input_start: Option<Instant>,
    latencies: VecDeque<Duration>,
}

impl LatencyProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// An edit arrived. A second mark before a render keeps the earlier one.
    pub fn mark_input(&mut self, now: Instant) {
        self.input_start.get_or_insert(now);
    }

    /// A render finished; returns the measured latency if an input was pending
    pub fn record_render_complete(&mut self, now: Instant) -> Option<Duration> {
        let start = self.input_start.take()?;
        let latency = now.saturating_duration_since(start);
        self.latencies.push_back(latency);
        if self.latencies.len() > LATENCY_HISTORY_SIZE {
            self.latencies.pop_front();
        }
        tracing::trace!(latency_ms = latency.as_secs_f64() * 1000.0, "Preview latency");
        Some(latency)
    }

    pub fn latest(&self) -> Option<Duration> {
        self.latencies.back().copied()
    }

    pub fn average(&self) -> Duration {
        if self.latencies.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.latencies.iter().sum();
        total / self.latencies.len() as u32
    }

    pub fn count(&self) -> usize {
        self.latencies.len()
    }

    pub fn summary(&self) -> Option<LatencySummary> {
        let latest = self.latest()?;
        Some(LatencySummary {
            latest,
            average: self.average(),
            samples: self.count(),
            grade: LatencyGrade::from_duration(latest),
        })
    }
}
