//! Shared-bus serialization.
//!
//! The card reader and the EEPROM may sit on the same physical bus with
//! separate chip selects. Both drivers must then serialize through one
//! lock: no two transactions may interleave on the wire. `SharedBus` wraps
//! a bus in an `Arc<tokio::sync::Mutex>` and hands each driver a clone;
//! every transaction holds the lock for exactly its own duration.

use crate::error::Result;
use crate::traits::SpiBus;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Cloneable wrapper granting serialized access to one underlying bus.
///
/// # Examples
///
/// ```
/// use gatekeeper_hardware::{SharedBus, SpiBus};
/// use gatekeeper_hardware::mock::SimEeprom;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> gatekeeper_hardware::Result<()> {
/// let (device, _handle) = SimEeprom::new();
/// let bus_a = SharedBus::new(device);
/// let bus_b = bus_a.clone();
/// // bus_a and bus_b never interleave transactions on the wire
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SharedBus<B> {
    inner: Arc<Mutex<B>>,
}

impl<B> SharedBus<B> {
    /// Wrap a bus for shared use.
    pub fn new(bus: B) -> Self {
        Self {
            inner: Arc::new(Mutex::new(bus)),
        }
    }
}

impl<B> Clone for SharedBus<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: SpiBus> SpiBus for SharedBus<B> {
    async fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        let mut bus = self.inner.lock().await;
        bus.transfer(tx, rx).await
    }

    async fn write(&mut self, tx: &[u8]) -> Result<()> {
        let mut bus = self.inner.lock().await;
        bus.write(tx).await
    }
}
