//! Deadline-bounded authorization over an [`AuthzTransport`].

use crate::error::AuthzError;
use crate::transport::{AuthzTransport, HttpResponse};
use gatekeeper_core::AuthorizationResult;
use gatekeeper_core::constants::AUTHZ_PATH;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

#[derive(Debug, Serialize)]
struct CheckAccessRequest {
    sn: String,
}

/// Source of access decisions for scanned badge serials.
///
/// The contract is total: `authorize` never fails and never outlives its
/// deadline. Transport trouble surfaces as `TransportError`, an elapsed
/// deadline as `TimedOut`, and both reduce to a denial downstream.
pub trait Authorizer: Send {
    /// Decide access for `serial_number` within `deadline`.
    fn authorize(
        &mut self,
        serial_number: u64,
        deadline: Duration,
    ) -> impl Future<Output = AuthorizationResult> + Send;
}

/// Authorization client over a pluggable transport.
///
/// Each call clones the transport into a transient spawned task and joins
/// it through a oneshot channel raced against the deadline. When the
/// deadline wins, the task is left to finish in the background; its result
/// lands in a closed channel and is discarded.
#[derive(Debug)]
pub struct AuthzClient<T> {
    transport: T,
}

impl<T: AuthzTransport> AuthzClient<T> {
    /// Create a client over the given transport.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

impl<T: AuthzTransport> Authorizer for AuthzClient<T> {
    async fn authorize(&mut self, serial_number: u64, deadline: Duration) -> AuthorizationResult {
        let payload = CheckAccessRequest {
            sn: serial_number.to_string(),
        };
        let body = match serde_json::to_string(&payload) {
            Ok(body) => body,
            Err(e) => {
                warn!(serial = serial_number, "failed to encode request: {e}");
                return AuthorizationResult::TransportError(AuthzError::from(e).to_string());
            }
        };

        trace!(serial = serial_number, deadline_ms = deadline.as_millis() as u64, "authorizing");

        let transport = self.transport.clone();
        let (result_tx, result_rx) = oneshot::channel();
        tokio::spawn(async move {
            // The receiver is gone once the deadline fires; a late result
            // dies here instead of reaching the caller.
            let _ = result_tx.send(transport.post(AUTHZ_PATH, body).await);
        });

        match tokio::time::timeout(deadline, result_rx).await {
            Ok(Ok(Ok(response))) => verdict(serial_number, &response),
            Ok(Ok(Err(e))) => {
                warn!(serial = serial_number, "authorization transport failed: {e}");
                AuthorizationResult::TransportError(e.to_string())
            }
            Ok(Err(_)) => {
                // The spawned task panicked or was aborted before sending.
                warn!(serial = serial_number, "authorization task dropped its result");
                AuthorizationResult::TransportError(
                    "authorization task dropped its result".to_string(),
                )
            }
            Err(_) => {
                warn!(
                    serial = serial_number,
                    deadline_ms = deadline.as_millis() as u64,
                    "no verdict before the deadline"
                );
                AuthorizationResult::TimedOut
            }
        }
    }
}

/// Interpret the server's single-character verdict.
fn verdict(serial_number: u64, response: &HttpResponse) -> AuthorizationResult {
    if !(200..300).contains(&response.status) {
        warn!(
            serial = serial_number,
            status = response.status,
            "authorization server answered with a non-success status"
        );
    }

    let granted = response.body.first() == Some(&b'1');
    debug!(serial = serial_number, granted, "verdict received");

    if granted {
        AuthorizationResult::Granted
    } else {
        AuthorizationResult::Denied
    }
}
