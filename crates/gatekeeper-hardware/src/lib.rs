//! Hardware capability layer for the gatekeeper access controller.
//!
//! This crate defines the trait seams between the protocol drivers and the
//! physical peripherals: an addressed half-duplex serial bus ([`SpiBus`]),
//! binary indicator lines ([`OutputPin`]) and a PWM buzzer channel
//! ([`PwmOutput`]). Drivers own their device handle exclusively; nothing
//! above them ever performs a bus transaction directly.
//!
//! # Design
//!
//! - **Async-first**: all I/O methods return `impl Future + Send` (Edition
//!   2024 RPITIT), so driver futures stay spawnable without `async_trait`.
//! - **Capability-oriented**: no singletons or global handles; a component
//!   gets a pin or a bus by owning a value that implements the trait.
//! - **Shared-bus safe**: when the card reader and the EEPROM sit on one
//!   physical bus, [`SharedBus`] serializes both drivers through a single
//!   `tokio::sync::Mutex` so no two transactions interleave on the wire.
//!
//! # Mocks
//!
//! The [`mock`] module carries the test doubles used throughout the
//! workspace: a strict scripted bus with a transaction log, a functional
//! 25LC040-style EEPROM simulation, and recording pin/PWM outputs. They are
//! compiled unconditionally so downstream crates can use them in tests and
//! in the demo binary.

pub mod bus;
pub mod error;
pub mod mock;
pub mod traits;

pub use bus::SharedBus;
pub use error::{HardwareError, Result};
pub use traits::{OutputPin, PwmOutput, SpiBus};
