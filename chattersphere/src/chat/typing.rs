//! Local typing indicator state.
//!
//! The indicator turns on with each keystroke and off either when the idle
//! window elapses (driven by the session's `typingIdle` timer) or on send.

use std::time::Duration;

use chattersphere_proto::message::Timestamp;

/// Keystroke inactivity after which the indicator clears.
pub const TYPING_IDLE_WINDOW: Duration = Duration::from_millis(1_000);

/// Snapshot of the typing indicator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypingState {
    /// Whether the local participant is currently composing.
    pub is_active: bool,
    /// Time of the most recent keystroke, if any.
    pub last_keystroke_at: Option<Timestamp>,
}

/// Owner of [`TypingState`].
#[derive(Debug, Clone, Default)]
pub struct TypingIndicator {
    state: TypingState,
}

impl TypingIndicator {
    /// Creates an inactive indicator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a keystroke. Returns `true` if the indicator just turned on.
    pub const fn keystroke(&mut self, now: Timestamp) -> bool {
        let was_active = self.state.is_active;
        self.state.is_active = true;
        self.state.last_keystroke_at = Some(now);
        !was_active
    }

    /// Turns the indicator off. Returns `true` if it was on.
    pub const fn stop(&mut self) -> bool {
        let was_active = self.state.is_active;
        self.state.is_active = false;
        was_active
    }

    /// Whether the indicator is on.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.state.is_active
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> TypingState {
        self.state
    }
}
