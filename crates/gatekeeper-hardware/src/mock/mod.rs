//! Mock peripheral implementations for testing and development.
//!
//! Two bus doubles with different jobs: [`MockSpiBus`] is a strict scripted
//! bus that verifies exact wire framing, while [`SimEeprom`] behaves like a
//! real 25LC040-class EEPROM so storage logic can be exercised end to end.
//! [`MockPin`] and [`MockPwm`] record every output change for assertions on
//! actuation sequences.

mod outputs;
mod spi;

pub use outputs::{MockPin, MockPinHandle, MockPwm, MockPwmHandle};
pub use spi::{BusTransaction, MockSpiBus, MockSpiBusHandle, SimEeprom, SimEepromHandle};
