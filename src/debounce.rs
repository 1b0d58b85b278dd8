//! Replan debouncing.
//!
//! Viewport changes arrive in bursts (drag deltas, wheel ticks, animation
//! frames). Replanning on every one is wasted work, so changes are
//! coalesced: a short delay while a drag is in progress, a slightly longer
//! one for input to settle.

use instant::Instant;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ReplanDebouncer {
    drag_delay: Duration,
    settle_delay: Duration,
    last_change: Option<Instant>,
    dragging: bool,
    forced: bool,
}

impl ReplanDebouncer {
    pub fn new(drag_delay: Duration, settle_delay: Duration) -> Self {
        Self {
            drag_delay,
            settle_delay,
            last_change: None,
            dragging: false,
            forced: false,
        }
    }

    /// Record a viewport change. Repeated calls push the deadline back.
    pub fn note_change(&mut self, now: Instant, dragging: bool) {
        self.last_change = Some(now);
        self.dragging = dragging;
        self.forced = false;
    }

    /// Request an immediate replan on the next [`Self::take_ready`].
    pub fn force(&mut self) {
        self.last_change = Some(Instant::now());
        self.forced = true;
    }

    pub fn is_pending(&self) -> bool {
        self.last_change.is_some()
    }

    /// True once the appropriate delay has elapsed since the last change.
    /// Consumes the pending change.
    pub fn take_ready(&mut self, now: Instant) -> bool {
        let Some(changed_at) = self.last_change else {
            return false;
        };
        let delay = if self.forced {
            Duration::ZERO
        } else if self.dragging {
            self.drag_delay
        } else {
            self.settle_delay
        };
        if now.duration_since(changed_at) >= delay {
            self.last_change = None;
            self.forced = false;
            true
        } else {
            false
        }
    }
}
