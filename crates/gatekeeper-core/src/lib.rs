//! Core types shared across the gatekeeper access controller.
//!
//! This crate defines the data model of the access pipeline: the tag event
//! produced by the card reader, the authorization verdict and its reduction
//! to a physical grant/deny decision, and the audit record committed to
//! nonvolatile storage. It also carries the error taxonomy and the timing
//! and layout constants the driver crates agree on.
//!
//! No I/O happens here; everything is plain data.

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
