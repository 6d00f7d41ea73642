//! Two-phase confirmation state machine.
//!
//! A destructive action is first *armed*, then performed on a second, confirming
//! interaction. An armed machine falls back to idle once its timeout elapses.
//! Time is always passed in by the caller so the machine stays pure.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfirmState {
    #[default]
    Idle,
    Armed {
        since: Instant,
    },
}

#[derive(Debug, Clone)]
pub struct ConfirmMachine {
    state: ConfirmState,
    timeout: Duration,
}

impl ConfirmMachine {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            state: ConfirmState::Idle,
            timeout,
        }
    }

    /// Current state, with an expired arm already reported as idle.
    #[must_use]
    pub fn state(&self, now: Instant) -> ConfirmState {
        match self.state {
            ConfirmState::Armed { since } if now.duration_since(since) >= self.timeout => {
                ConfirmState::Idle
            }
            state => state,
        }
    }

    #[must_use]
    pub fn is_armed(&self, now: Instant) -> bool {
        matches!(self.state(now), ConfirmState::Armed { .. })
    }

    pub fn arm(&mut self, now: Instant) {
        self.state = ConfirmState::Armed { since: now };
    }

    /// Consume a confirming interaction.
    ///
    /// Returns `true` exactly when the machine was armed and had not timed out.
    /// The machine is idle afterwards either way.
    pub fn confirm(&mut self, now: Instant) -> bool {
        let armed = self.is_armed(now);
        self.state = ConfirmState::Idle;
        armed
    }

    pub fn reset(&mut self) {
        self.state = ConfirmState::Idle;
    }
}
