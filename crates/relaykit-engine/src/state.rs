//! Relay session state machine.
//!
//! This module models the single thread of control inside a relay session.
//! Steady-state relaying is a four-state cycle, with one terminal state:
//!
//! - `Polling`: asking the emulator for pending terminal data
//! - `Forwarding`: unwrapping the fetched data into a card command
//! - `AwaitingCard`: waiting on the genuine card's answer
//! - `Responding`: pushing the answer back to the emulator
//! - `Stopped`: terminal; reached by cancellation or an unusable emulator
//!
//! # Valid transitions
//!
//! - Polling → Forwarding → AwaitingCard → Responding → Polling
//! - Polling → Stopped
//! - Responding → Stopped
//!
//! An empty poll does not leave `Polling`; the loop backs off and polls
//! again from the same state.
//!
//! # Examples
//!
//! ```
//! use relaykit_engine::{RelayState, RelayStateMachine};
//!
//! let mut machine = RelayStateMachine::new();
//! assert_eq!(machine.current_state(), RelayState::Polling);
//!
//! machine.transition_to(RelayState::Forwarding).unwrap();
//! assert!(machine.transition_to(RelayState::Polling).is_err());
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use relaykit_core::{Error, Result};

/// Maximum number of state transitions kept in history.
///
/// A full relay cycle is four transitions, so this covers the last sixteen
/// relayed commands when a session needs debugging.
const MAX_HISTORY_SIZE: usize = 64;

/// States of the relay loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayState {
    /// Asking the emulator for data the terminal has sent.
    Polling,

    /// Unwrapping fetched data into the command meant for the card.
    Forwarding,

    /// Waiting for the genuine card's response.
    AwaitingCard,

    /// Pushing the response back to the emulator.
    Responding,

    /// Terminal state; the session is over.
    Stopped,
}

impl fmt::Display for RelayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            RelayState::Polling => "Polling",
            RelayState::Forwarding => "Forwarding",
            RelayState::AwaitingCard => "AwaitingCard",
            RelayState::Responding => "Responding",
            RelayState::Stopped => "Stopped",
        };
        write!(f, "{state_str}")
    }
}

impl RelayState {
    /// Check whether a transition to `target` is valid from this state.
    #[must_use]
    pub fn can_transition_to(&self, target: &RelayState) -> bool {
        matches!(
            (self, target),
            (RelayState::Polling, RelayState::Forwarding)
                | (RelayState::Forwarding, RelayState::AwaitingCard)
                | (RelayState::AwaitingCard, RelayState::Responding)
                | (RelayState::Responding, RelayState::Polling)
                | (RelayState::Polling | RelayState::Responding, RelayState::Stopped)
        )
    }

    /// Whether this state ends the session.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, RelayState::Stopped)
    }
}

/// A single recorded state transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    /// The state transitioned from.
    pub from: RelayState,

    /// The state transitioned to.
    pub to: RelayState,

    /// When the transition occurred. Not serialized; deserialization resets
    /// it to the current time.
    #[serde(skip, default = "Instant::now")]
    pub timestamp: Instant,
}

impl StateTransition {
    fn new(from: RelayState, to: RelayState) -> Self {
        Self {
            from,
            to,
            timestamp: Instant::now(),
        }
    }

    /// Time elapsed since this transition occurred.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.timestamp.elapsed()
    }
}

/// State machine enforcing the relay cycle.
///
/// Tracks the current state, when it was entered, and a bounded transition
/// history for diagnostics. Not thread-safe by design: one session, one
/// thread of control.
#[derive(Debug)]
pub struct RelayStateMachine {
    current_state: RelayState,
    state_entered_at: Instant,
    history: VecDeque<StateTransition>,
}

impl RelayStateMachine {
    /// Create a state machine in the `Polling` state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current_state: RelayState::Polling,
            state_entered_at: Instant::now(),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    /// The current state.
    #[must_use]
    pub fn current_state(&self) -> RelayState {
        self.current_state
    }

    /// Time spent in the current state so far.
    #[must_use]
    pub fn time_in_current_state(&self) -> Duration {
        self.state_entered_at.elapsed()
    }

    /// Recorded transitions, oldest first.
    #[must_use]
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// Transition to a new state, validating the move.
    ///
    /// # Errors
    /// Returns `Error::InvalidStateTransition` when the relay cycle does
    /// not allow the requested transition.
    pub fn transition_to(&mut self, new_state: RelayState) -> Result<StateTransition> {
        if !self.current_state.can_transition_to(&new_state) {
            return Err(Error::InvalidStateTransition {
                from: self.current_state.to_string(),
                to: new_state.to_string(),
            });
        }

        let transition = StateTransition::new(self.current_state, new_state);
        if self.history.len() == MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
        self.history.push_back(transition.clone());

        self.current_state = new_state;
        self.state_entered_at = transition.timestamp;

        Ok(transition)
    }
}

impl Default for RelayStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
