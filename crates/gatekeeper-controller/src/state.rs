//! Access pipeline state machine.
//!
//! Every scanned badge moves through the same closed loop:
//!
//! ```text
//! Idle → Pending → Deciding → Actuating → Logging → Idle
//! ```
//!
//! - `Pending`: a tag event was accepted; the processing cue plays and the
//!   authorization deadline is armed.
//! - `Deciding`: the authorization request is in flight.
//! - `Actuating`: the grant or deny sequence plays.
//! - `Logging`: the audit record is committed.
//!
//! There are no shortcuts: a timeout or transport failure is still a
//! decision (a denial) and still travels through `Actuating` and `Logging`.
//! The machine validates every transition and keeps a bounded history of
//! recent transitions for diagnostics.

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use gatekeeper_core::{Error, Result};

/// Maximum number of state transitions kept for diagnostics.
///
/// One access flow is five transitions, so this window holds the last
/// dozen badge presentations.
const MAX_HISTORY_SIZE: usize = 60;

/// Phases of the access pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerState {
    /// Polling the reader, no badge in flight.
    Idle,

    /// Tag event accepted, processing cue playing, deadline armed.
    Pending,

    /// Authorization request in flight.
    Deciding,

    /// Grant or deny sequence playing.
    Actuating,

    /// Audit record being committed.
    Logging,
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ControllerState::Idle => "Idle",
            ControllerState::Pending => "Pending",
            ControllerState::Deciding => "Deciding",
            ControllerState::Actuating => "Actuating",
            ControllerState::Logging => "Logging",
        };
        write!(f, "{name}")
    }
}

impl ControllerState {
    /// Check whether the pipeline may move from this state to `target`.
    ///
    /// The pipeline is a single cycle, so each state has exactly one legal
    /// successor.
    ///
    /// # Examples
    ///
    /// ```
    /// use gatekeeper_controller::ControllerState;
    ///
    /// assert!(ControllerState::Idle.can_transition_to(&ControllerState::Pending));
    /// assert!(!ControllerState::Idle.can_transition_to(&ControllerState::Actuating));
    /// ```
    pub fn can_transition_to(&self, target: &ControllerState) -> bool {
        matches!(
            (self, target),
            (ControllerState::Idle, ControllerState::Pending)
                | (ControllerState::Pending, ControllerState::Deciding)
                | (ControllerState::Deciding, ControllerState::Actuating)
                | (ControllerState::Actuating, ControllerState::Logging)
                | (ControllerState::Logging, ControllerState::Idle)
        )
    }
}

/// One recorded state transition.
///
/// The timestamp is process-local and is not serialized; a deserialized
/// transition is stamped with the time of deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    /// The state transitioned from.
    pub from: ControllerState,

    /// The state transitioned to.
    pub to: ControllerState,

    /// When the transition occurred.
    #[serde(skip, default = "Instant::now")]
    pub timestamp: Instant,
}

impl StateTransition {
    /// Record a transition happening now.
    pub fn new(from: ControllerState, to: ControllerState) -> Self {
        Self {
            from,
            to,
            timestamp: Instant::now(),
        }
    }

    /// Time elapsed since this transition occurred.
    pub fn elapsed(&self) -> Duration {
        self.timestamp.elapsed()
    }
}

/// Validated state machine with a bounded transition history.
///
/// Not thread-safe by design; the controller task is its only owner.
#[derive(Debug)]
pub struct StateMachine {
    current_state: ControllerState,
    state_entered_at: Instant,
    history: VecDeque<StateTransition>,
}

impl StateMachine {
    /// Create a machine in `Idle` with empty history.
    pub fn new() -> Self {
        Self {
            current_state: ControllerState::Idle,
            state_entered_at: Instant::now(),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    /// The state the pipeline is currently in.
    pub fn current_state(&self) -> &ControllerState {
        &self.current_state
    }

    /// Time spent in the current state so far.
    pub fn time_in_current_state(&self) -> Duration {
        self.state_entered_at.elapsed()
    }

    /// The recorded transitions, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// The most recent transitions, up to `count`, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<StateTransition> {
        self.history
            .iter()
            .rev()
            .take(count)
            .rev()
            .cloned()
            .collect()
    }

    /// Move to `new_state`, validating the transition and recording it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` if `new_state` is not the legal
    /// successor of the current state; the machine is left unchanged.
    pub fn transition_to(&mut self, new_state: ControllerState) -> Result<StateTransition> {
        if !self.current_state.can_transition_to(&new_state) {
            return Err(Error::InvalidStateTransition {
                from: self.current_state.to_string(),
                to: new_state.to_string(),
            });
        }

        let transition = StateTransition::new(self.current_state, new_state);
        self.perform_state_change(new_state, transition.clone());
        Ok(transition)
    }

    /// Force the machine back to `Idle` regardless of current state.
    ///
    /// Error recovery only; normal flows travel the full cycle.
    pub fn reset(&mut self) -> StateTransition {
        let transition = StateTransition::new(self.current_state, ControllerState::Idle);
        self.perform_state_change(ControllerState::Idle, transition.clone());
        transition
    }

    fn perform_state_change(&mut self, new_state: ControllerState, transition: StateTransition) {
        self.current_state = new_state;
        self.state_entered_at = Instant::now();

        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
