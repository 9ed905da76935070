//! Actuation sequencing for the access controller.
//!
//! Every access decision ends in one of three fixed audiovisual sequences
//! over two indicator pins and a PWM buzzer: a short processing cue while
//! the authorization request is in flight, a grant cue, or a deny cue.
//! The sequences are immutable tables ([`sequence`]); the [`Sequencer`]
//! plays them against real or mock outputs and guarantees everything is
//! back at idle when it returns.

mod sequence;
mod sequencer;

pub use sequence::{Sequence, SequenceKind, Step};
pub use sequencer::{Actuator, Sequencer};
