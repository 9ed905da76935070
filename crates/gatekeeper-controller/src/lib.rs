//! Access controller binding the reader, authorization client, actuation
//! sequencer, and audit log into one event loop.
//!
//! # Architecture
//!
//! ```text
//! AccessController (one task)
//!     │
//!     ├─> TagPoller ──────── reader driver (RC522 over SPI)
//!     ├─> Authorizer ─────── bounded-time HTTP client
//!     ├─> Actuator ───────── indicator pins + buzzer PWM
//!     ├─> AuditSink ──────── EEPROM audit ring
//!     └─> StateMachine ───── Idle → Pending → Deciding → Actuating → Logging
//! ```
//!
//! The controller is the sole owner of every stage and the sole writer of
//! the audit log. Exactly one audit record is committed per tag event,
//! whatever the decision was.

mod controller;
mod state;

pub use controller::{AccessController, AccessOutcome, ControllerConfig};
pub use state::{ControllerState, StateMachine, StateTransition};
