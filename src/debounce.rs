//! Single-slot cancellable timer.
//!
//! Each [`Debouncer::schedule`] cancels the outstanding timer before arming a
//! new one, so a burst of triggers yields exactly one firing after the burst
//! goes quiet. A timer that was cancelled but still reaches the controller is
//! recognized as stale by [`Debouncer::fire`].

#[cfg(test)]
#[path = "debounce_test.rs"]
mod debounce_test;

use crate::dom::{Dom, TimerId};

#[derive(Debug)]
pub struct Debouncer {
    delay_ms: u32,
    pending: Option<TimerId>,
}

impl Debouncer {
    #[must_use]
    pub fn new(delay_ms: u32) -> Self {
        Self { delay_ms, pending: None }
    }

    /// Replace any outstanding timer with a fresh one.
    pub fn schedule<D: Dom>(&mut self, dom: &mut D) {
        self.cancel(dom);
        self.pending = Some(dom.set_timeout(self.delay_ms));
    }

    /// Cancel the outstanding timer, if any.
    pub fn cancel<D: Dom>(&mut self, dom: &mut D) {
        if let Some(id) = self.pending.take() {
            dom.clear_timeout(id);
        }
    }

    /// Consume a timer firing. Returns true only for the outstanding timer.
    pub fn fire(&mut self, id: TimerId) -> bool {
        if self.pending == Some(id) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }
}
