//! Nonvolatile storage for the gatekeeper access controller.
//!
//! Two layers: [`Eeprom25lc040`] frames byte and page transactions to a
//! 4-Kbit serial EEPROM (write-enable gating, page-size enforcement, fixed
//! settle delay), and [`AuditLog`] keeps the circular ring of access
//! records on top of it. The controller talks to the ring through the
//! [`AuditSink`] trait and never frames a storage transaction itself.

mod audit;
mod eeprom;
pub mod error;

pub use audit::{AuditLog, AuditSink, IndexRecovery};
pub use eeprom::Eeprom25lc040;
pub use error::{StorageError, StorageResult};
