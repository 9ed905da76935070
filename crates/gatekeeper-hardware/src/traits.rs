//! Hardware capability trait definitions.
//!
//! These traits establish the contract between the protocol drivers and the
//! peripherals they frame transactions for. Methods are declared as
//! `-> impl Future + Send` (Edition 2024 RPITIT) rather than `async fn` so
//! that generic driver futures remain `Send` and can be driven from spawned
//! tasks. Implementations write plain `async fn`; the signatures are
//! interchangeable.
//!
//! The traits are deliberately not object-safe. Drivers are generic over
//! their device (`Rc522<B: SpiBus>`) and get compile-time monomorphization
//! in exchange.

use crate::error::Result;
use std::future::Future;

/// Addressed half-duplex serial bus.
///
/// One call is one framed bus transaction: chip select asserted, `tx`
/// clocked out, then for [`transfer`](SpiBus::transfer) `rx.len()` bytes
/// clocked back in, chip select released. The device handle behind an
/// implementation is exclusively owned; serializing concurrent users is the
/// owner's job (see [`SharedBus`](crate::bus::SharedBus)).
pub trait SpiBus: Send {
    /// Write-then-read exchange. The response begins after the last `tx`
    /// byte, so a register read framed as a 1-byte address with a 1-byte
    /// response occupies 16 bits on the wire with the data byte at offset 1.
    ///
    /// # Errors
    ///
    /// Returns a bus transaction error if the exchange does not complete.
    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> impl Future<Output = Result<()>> + Send;

    /// Write-only transaction of `tx.len()` bytes.
    ///
    /// # Errors
    ///
    /// Returns a bus transaction error if the write does not complete.
    fn write(&mut self, tx: &[u8]) -> impl Future<Output = Result<()>> + Send;
}

/// A binary output line (indicator light).
///
/// The actuation sequencer owns its pins exclusively for its entire run;
/// no other component toggles them.
pub trait OutputPin: Send {
    /// Drive the line high (`true`) or low (`false`).
    ///
    /// # Errors
    ///
    /// Returns an error if the line cannot be driven.
    fn set_level(&mut self, high: bool) -> impl Future<Output = Result<()>> + Send;
}

/// A PWM-driven output channel (buzzer).
///
/// Peripheral bring-up (timer setup, pin muxing) happens outside this
/// crate; the trait exposes only the set-duty-cycle primitive.
pub trait PwmOutput: Send {
    /// Set the duty cycle, `0.0` (silent) to `1.0` (full amplitude).
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `duty` is outside `0.0..=1.0`, or a bus
    /// error if the channel cannot be updated.
    fn set_duty(&mut self, duty: f32) -> impl Future<Output = Result<()>> + Send;
}
