//! Debounce window state machine.
//!
//! ```text
//! Idle --arrival--> Armed(deadline) --arrival--> Armed(now + delay)
//! Armed(deadline) --timer, deadline passed--> Flushing
//! Flushing --done, keys waiting--> Armed(now + delay)
//! Flushing --done, nothing waiting--> Idle
//! ```
//!
//! Arrivals during `Flushing` do not start a second flush; they are picked
//! up by the re-arm when the current flush completes. A timer task that dies
//! without completing sends any state back to `Idle` via `reset`.

use std::time::Duration;

use tokio::time::Instant;

/// Current phase of the batch window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    Idle,
    Armed { deadline: Instant },
    Flushing,
}

/// What the timer task should do after waking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// The deadline moved; sleep until it.
    Wait(Instant),
    /// The window closed; flush the pending snapshot.
    Flush,
    /// Nothing armed; the timer task exits.
    Stop,
}

#[derive(Debug)]
pub struct BatchWindow {
    state: WindowState,
    delay: Duration,
}

impl BatchWindow {
    pub fn new(delay: Duration) -> Self {
        Self {
            state: WindowState::Idle,
            delay,
        }
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    /// Record a new pending key. Returns true when a timer task must be
    /// started; at most one runs at a time.
    pub fn on_arrival(&mut self, now: Instant) -> bool {
        match self.state {
            WindowState::Idle => {
                self.state = WindowState::Armed {
                    deadline: now + self.delay,
                };
                true
            }
            WindowState::Armed { .. } => {
                self.state = WindowState::Armed {
                    deadline: now + self.delay,
                };
                false
            }
            WindowState::Flushing => false,
        }
    }

    pub fn on_timer(&mut self, now: Instant) -> TimerAction {
        match self.state {
            WindowState::Armed { deadline } if deadline <= now => {
                self.state = WindowState::Flushing;
                TimerAction::Flush
            }
            WindowState::Armed { deadline } => TimerAction::Wait(deadline),
            WindowState::Idle | WindowState::Flushing => TimerAction::Stop,
        }
    }

    /// Close out a flush, re-arming when keys arrived in the meantime.
    pub fn on_flush_complete(&mut self, now: Instant, has_pending: bool) {
        self.state = if has_pending {
            WindowState::Armed {
                deadline: now + self.delay,
            }
        } else {
            WindowState::Idle
        };
    }

    /// Abandon the current window. The next arrival starts a fresh timer.
    pub fn reset(&mut self) {
        self.state = WindowState::Idle;
    }
}
