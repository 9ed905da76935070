//! Card-protocol driver for the contactless reader.
//!
//! Frames read/write register transactions to an MFRC522-class reader over
//! the half-duplex addressed bus and exposes one operation to the pipeline:
//! [`TagPoller::poll`], returning a [`TagEvent`] on a presence edge or
//! `None` otherwise.
//!
//! # Wire format
//!
//! Per MFRC522 datasheet section 8.1.2: the address byte is the register
//! address shifted left by one with bit 0 always clear; bit 7 set selects a
//! read. A register write is `n + 1` bytes (address plus data); a register
//! read is a 16-bit exchange returning one data byte at offset 1.
//!
//! # Failure semantics
//!
//! A failed bus transaction is indistinguishable from "no tag in the
//! field": both count as a missed poll toward the presence hysteresis and
//! neither is escalated. A wedged reader therefore degrades to silence,
//! not to pipeline errors.

mod driver;
mod presence;
mod registers;

pub use driver::{Rc522, Rc522Config, TagPoller};
pub use presence::PresenceFilter;

pub use gatekeeper_core::TagEvent;
