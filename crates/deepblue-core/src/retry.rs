//! Cancellable bounded retry driven by frame time
//!
//! The host advances the retry with the time elapsed since the last frame;
//! at most one attempt runs per tick, the first one immediately.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Pending,
    Succeeded { attempts: u32 },
    Exhausted { attempts: u32 },
    Cancelled,
}

impl RetryState {
    pub fn is_finished(self) -> bool {
        !matches!(self, RetryState::Pending)
    }
}

#[derive(Debug, Clone)]
pub struct BoundedRetry {
    max_attempts: u32,
    interval: Duration,
    attempts: u32,
    elapsed: Duration,
    next_due: Duration,
    state: RetryState,
}

impl BoundedRetry {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            interval,
            attempts: 0,
            elapsed: Duration::ZERO,
            next_due: Duration::ZERO,
            state: RetryState::Pending,
        }
    }

    /// Advance by `delta` and run `attempt` if one is due
    ///
    /// `attempt` receives the 1-based attempt number and returns `true` once
    /// the condition holds.
    pub fn tick<F>(&mut self, delta: Duration, mut attempt: F) -> RetryState
    where
        F: FnMut(u32) -> bool,
    {
        if self.state.is_finished() {
            return self.state;
        }

        self.elapsed += delta;
        if self.elapsed < self.next_due {
            return self.state;
        }

        self.attempts += 1;
        if attempt(self.attempts) {
            self.state = RetryState::Succeeded {
                attempts: self.attempts,
            };
        } else if self.attempts >= self.max_attempts {
            self.state = RetryState::Exhausted {
                attempts: self.attempts,
            };
        } else {
            self.next_due = self.elapsed + self.interval;
        }
        self.state
    }

    /// Stop retrying; later ticks never call the attempt again
    pub fn cancel(&mut self) {
        if !self.state.is_finished() {
            self.state = RetryState::Cancelled;
        }
    }

    pub fn state(&self) -> RetryState {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}
