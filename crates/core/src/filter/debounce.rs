//! Debounced value: a raw input and the committed value derived from it.

use std::time::Duration;

use tokio::time::Instant;

/// A value whose committed form trails its raw input by a fixed delay.
///
/// Each `input` pushes the deadline out to `now + delay`. The committed value
/// only changes when `commit_due` is called at or after the deadline, so a
/// burst of keystrokes commits once, `delay` after the last one.
#[derive(Debug, Clone)]
pub struct Debounced<T> {
    raw: T,
    committed: T,
    delay: Duration,
    deadline: Option<Instant>,
}

impl<T: Clone + PartialEq> Debounced<T> {
    pub fn new(initial: T, delay: Duration) -> Self {
        Self {
            raw: initial.clone(),
            committed: initial,
            delay,
            deadline: None,
        }
    }

    /// Record a new raw value and restart the delay.
    pub fn input(&mut self, value: T, now: Instant) -> Instant {
        self.raw = value;
        let deadline = now + self.delay;
        self.deadline = Some(deadline);
        deadline
    }

    /// Commit the raw value if the delay has elapsed.
    ///
    /// Returns the new committed value when it changed.
    pub fn commit_due(&mut self, now: Instant) -> Option<&T> {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                if self.raw != self.committed {
                    self.committed = self.raw.clone();
                    Some(&self.committed)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Set both raw and committed values without waiting.
    pub fn set_immediate(&mut self, value: T) {
        self.raw = value.clone();
        self.committed = value;
        self.deadline = None;
    }

    pub fn raw(&self) -> &T {
        &self.raw
    }

    pub fn committed(&self) -> &T {
        &self.committed
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}
