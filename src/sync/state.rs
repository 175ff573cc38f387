//! Per-direction sync state machine
//!
//! `Idle -> Pending(deadline) -> AwaitingFrame -> Settling(until) -> Idle`
//!
//! A direction is "in flight" while it is `AwaitingFrame` or `Settling`: the
//! first covers the gap between the debounce firing and the deferred frame
//! work, the second swallows the scroll events the sync itself produces.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirectionState {
    #[default]
    Idle,
    /// Debounce running; fires at the deadline
    Pending(Instant),
    /// Debounce fired, waiting for the next frame to do the work
    AwaitingFrame,
    /// Sync performed, ignoring echoes until the deadline
    Settling(Instant),
}

/// What a tick did to a single direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Unchanged,
    /// Debounce fired and the guard passed
    Armed,
    /// Debounce fired but the guard failed, pending action dropped
    Dropped,
    /// Settle period ended
    Settled,
}

impl DirectionState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::AwaitingFrame | Self::Settling(_))
    }

    /// Start or renew the debounce window
    pub fn schedule(&mut self, now: Instant, debounce: Duration) {
        *self = Self::Pending(now + debounce);
    }

    /// Advance timers. `guard_ok` is evaluated only when a debounce is due.
    pub fn tick(&mut self, now: Instant, guard_ok: impl FnOnce() -> bool) -> TickOutcome {
        match *self {
            Self::Pending(deadline) if now >= deadline => {
                if guard_ok() {
                    *self = Self::AwaitingFrame;
                    TickOutcome::Armed
                } else {
                    *self = Self::Idle;
                    TickOutcome::Dropped
                }
            }
            Self::Settling(until) if now >= until => {
                *self = Self::Idle;
                TickOutcome::Settled
            }
            _ => TickOutcome::Unchanged,
        }
    }

    /// Record the outcome of the frame half
    pub fn finish_frame(&mut self, now: Instant, performed: bool, settle: Duration) {
        *self = if performed {
            Self::Settling(now + settle)
        } else {
            Self::Idle
        };
    }

    pub fn deadline(&self) -> Option<Instant> {
        match *self {
            Self::Pending(at) | Self::Settling(at) => Some(at),
            Self::Idle | Self::AwaitingFrame => None,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::Idle;
    }
}
