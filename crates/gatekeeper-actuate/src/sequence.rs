//! The three fixed actuation sequences.
//!
//! A sequence is a static list of output states with hold times. No state
//! is computed at runtime, so the full audiovisual behavior of the device
//! is readable (and reviewable) from the tables in this file.

use gatekeeper_core::constants::{DENY_BUZZ_DUTY, DENY_BUZZ_HOLD, DENY_BUZZ_REPEATS, GRANT_HOLD};
use std::time::Duration;

/// One entry of a sequence: both indicator levels, the buzzer duty, and
/// how long to hold them before advancing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    /// Grant indicator level.
    pub grant: bool,

    /// Deny indicator level.
    pub deny: bool,

    /// Buzzer duty cycle, 0.0 to 1.0.
    pub duty: f32,

    /// Hold time before the next step.
    pub hold: Duration,
}

/// An immutable actuation sequence.
pub type Sequence = &'static [Step];

/// Short chirp duty for the processing and confirmation cues.
const CHIRP_DUTY: f32 = 0.4;

/// Two short chirps while the authorization request is in flight,
/// indicators dark.
static PENDING: &[Step] = &[
    Step {
        grant: false,
        deny: false,
        duty: CHIRP_DUTY,
        hold: Duration::from_millis(100),
    },
    Step {
        grant: false,
        deny: false,
        duty: 0.0,
        hold: Duration::from_millis(60),
    },
    Step {
        grant: false,
        deny: false,
        duty: CHIRP_DUTY,
        hold: Duration::from_millis(100),
    },
];

/// Grant indicator lit for the full hold with one confirmation chirp at
/// the front.
static GRANTED: &[Step] = &[
    Step {
        grant: true,
        deny: false,
        duty: CHIRP_DUTY,
        hold: Duration::from_millis(150),
    },
    Step {
        grant: true,
        deny: false,
        duty: 0.0,
        hold: Duration::from_millis(850),
    },
];

/// Deny indicator held for the whole sequence while the buzzer alternates
/// loud and silent.
static DENIED: &[Step] = &[
    Step {
        grant: false,
        deny: true,
        duty: DENY_BUZZ_DUTY,
        hold: DENY_BUZZ_HOLD,
    },
    Step {
        grant: false,
        deny: true,
        duty: 0.0,
        hold: DENY_BUZZ_HOLD,
    },
    Step {
        grant: false,
        deny: true,
        duty: DENY_BUZZ_DUTY,
        hold: DENY_BUZZ_HOLD,
    },
    Step {
        grant: false,
        deny: true,
        duty: 0.0,
        hold: DENY_BUZZ_HOLD,
    },
    Step {
        grant: false,
        deny: true,
        duty: DENY_BUZZ_DUTY,
        hold: DENY_BUZZ_HOLD,
    },
    Step {
        grant: false,
        deny: true,
        duty: 0.0,
        hold: DENY_BUZZ_HOLD,
    },
];

/// Which of the three sequences to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    /// Processing cue, played while the authorization request is in flight.
    Pending,

    /// Access granted.
    Granted,

    /// Access denied (including timeouts and transport failures).
    Denied,
}

impl SequenceKind {
    /// The steps of this sequence.
    pub fn steps(self) -> Sequence {
        match self {
            Self::Pending => PENDING,
            Self::Granted => GRANTED,
            Self::Denied => DENIED,
        }
    }

    /// Wall-clock length of the whole sequence.
    pub fn total_duration(self) -> Duration {
        self.steps().iter().map(|step| step.hold).sum()
    }
}
