//! Bounded-time authorization client.
//!
//! Turns a scanned badge serial into an [`AuthorizationResult`] by POSTing
//! `{"sn":"<decimal>"}` to the authorization endpoint and reading a
//! single-character verdict: a response body starting with `'1'` grants,
//! anything else (including an empty body) denies.
//!
//! The defining property of the client is that `authorize` always returns
//! within its deadline. The network round trip runs on a transient spawned
//! task joined through a oneshot channel; if the deadline fires first the
//! task is abandoned and its late result is discarded, never applied to a
//! badge that has already been refused.
//!
//! # Architecture
//!
//! ```text
//! AccessController
//!     │
//!     └─> AuthzClient ──(oneshot ⊢ timeout)── spawned task
//!                                                 │
//!                                                 └─> AuthzTransport ──(TCP)──> authorization server
//! ```
//!
//! [`AuthorizationResult`]: gatekeeper_core::AuthorizationResult

mod client;
mod error;
mod transport;

pub use client::{Authorizer, AuthzClient};
pub use error::AuthzError;
pub use transport::{AuthzTransport, HttpResponse, HttpTransport, HttpTransportConfig};
