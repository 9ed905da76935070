//! Transport seam between the client and the authorization server.
//!
//! [`AuthzTransport`] is the dependency-injection point for tests; the
//! production implementation is [`HttpTransport`], a deliberately thin
//! HTTP/1.1 POST over a short-lived tokio `TcpStream`:
//!
//! - **No automatic retry**: the caller decides what a failure means
//! - **No connection pooling**: one connection per request
//! - **No keepalive**: `Connection: close`, the response ends with EOF
//!
//! Everything beyond the single bounded POST belongs to higher layers.

use crate::error::AuthzError;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, trace, warn};

/// Status line and body of an HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code from the response line.
    pub status: u16,

    /// Response body, possibly empty.
    pub body: Vec<u8>,
}

/// One-shot request/response exchange with the authorization server.
///
/// Implementations are cloned into the transient task that carries each
/// request, so a clone must be cheap and independent.
pub trait AuthzTransport: Clone + Send + Sync + 'static {
    /// POST `body` as `application/json` to `path` and return the
    /// response.
    fn post(
        &self,
        path: &'static str,
        body: String,
    ) -> impl Future<Output = Result<HttpResponse, AuthzError>> + Send;
}

/// Configuration for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Authorization server address.
    pub server_addr: SocketAddr,

    /// Timeout applied separately to connect, send and receive.
    pub timeout: Duration,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            timeout: Duration::from_millis(3000),
        }
    }
}

/// Minimal HTTP/1.1 POST transport over a per-request `TcpStream`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    config: HttpTransportConfig,
}

impl HttpTransport {
    /// Create a transport for the given server.
    pub fn new(config: HttpTransportConfig) -> Self {
        debug!(server = %config.server_addr, "creating authorization transport");
        Self { config }
    }

    async fn connect(&self) -> Result<TcpStream, AuthzError> {
        let timeout = self.config.timeout;
        let stream =
            match tokio::time::timeout(timeout, TcpStream::connect(self.config.server_addr)).await
            {
                Ok(Ok(stream)) => stream,
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => {
                    return Err(AuthzError::ConnectionTimeout(timeout.as_millis() as u64));
                }
            };

        // Nagle batching can eat a large slice of a sub-second deadline on
        // a request this small.
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY: {e} - latency may be impacted");
        }

        Ok(stream)
    }
}

impl AuthzTransport for HttpTransport {
    async fn post(
        &self,
        path: &'static str,
        body: String,
    ) -> Result<HttpResponse, AuthzError> {
        let timeout = self.config.timeout;
        let mut stream = self.connect().await?;

        let request = build_request(path, &self.config.server_addr.to_string(), &body);
        trace!(path, len = body.len(), "sending authorization request");

        match tokio::time::timeout(timeout, stream.write_all(request.as_bytes())).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(AuthzError::WriteTimeout(timeout.as_millis() as u64)),
        }

        // Connection: close terminates the response with EOF, so the whole
        // exchange is a single bounded read.
        let mut raw = Vec::new();
        match tokio::time::timeout(timeout, stream.read_to_end(&mut raw)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(AuthzError::ReadTimeout(timeout.as_millis() as u64)),
        }

        if raw.is_empty() {
            return Err(AuthzError::ConnectionLost(
                "server closed the connection without responding".to_string(),
            ));
        }

        let response = parse_response(&raw)?;
        trace!(status = response.status, body_len = response.body.len(), "response received");
        Ok(response)
    }
}

/// Render the request head and body.
fn build_request(path: &str, host: &str, body: &str) -> String {
    format!(
        "POST {path} HTTP/1.1\r\n\
         Host: {host}\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {body}",
        body.len()
    )
}

/// Split a raw HTTP/1.x response into status code and body.
fn parse_response(raw: &[u8]) -> Result<HttpResponse, AuthzError> {
    const HEAD_END: &[u8] = b"\r\n\r\n";

    let head_end = raw
        .windows(HEAD_END.len())
        .position(|w| w == HEAD_END)
        .ok_or_else(|| {
            AuthzError::MalformedResponse("missing header terminator".to_string())
        })?;

    let head = std::str::from_utf8(&raw[..head_end])
        .map_err(|_| AuthzError::MalformedResponse("non-UTF-8 header block".to_string()))?;
    let status_line = head.lines().next().unwrap_or_default();

    // "HTTP/1.1 200 OK"
    let mut parts = status_line.split_whitespace();
    let version = parts.next().unwrap_or_default();
    if !version.starts_with("HTTP/1.") {
        return Err(AuthzError::MalformedResponse(format!(
            "unexpected protocol {version:?}"
        )));
    }
    let status = parts
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| {
            AuthzError::MalformedResponse(format!("unparseable status line {status_line:?}"))
        })?;

    Ok(HttpResponse {
        status,
        body: raw[head_end + HEAD_END.len()..].to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_head_carries_framing_headers() {
        let request = build_request("/check_access", "10.0.0.7:3000", r#"{"sn":"42"}"#);

        assert!(request.starts_with("POST /check_access HTTP/1.1\r\n"));
        assert!(request.contains("Host: 10.0.0.7:3000\r\n"));
        assert!(request.contains("Content-Type: application/json\r\n"));
        assert!(request.contains("Content-Length: 11\r\n"));
        assert!(request.contains("Connection: close\r\n"));
        assert!(request.ends_with("\r\n\r\n{\"sn\":\"42\"}"));
    }

    #[test]
    fn response_parses_status_and_body() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Length: 1\r\n\r\n1";
        let response = parse_response(raw).unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"1");
    }

    #[test]
    fn response_body_may_be_empty() {
        let raw = b"HTTP/1.1 204 No Content\r\n\r\n";
        let response = parse_response(raw).unwrap();
        assert_eq!(response.status, 204);
        assert!(response.body.is_empty());
    }

    #[test]
    fn truncated_response_is_malformed() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Len";
        assert!(matches!(
            parse_response(raw),
            Err(AuthzError::MalformedResponse(_))
        ));
    }

    #[test]
    fn non_http_response_is_malformed() {
        let raw = b"ICY 200 OK\r\n\r\nbody";
        assert!(matches!(
            parse_response(raw),
            Err(AuthzError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn connect_timeout_is_reported() {
        // Non-routable address (RFC 5737 TEST-NET-1)
        let transport = HttpTransport::new(HttpTransportConfig {
            server_addr: "192.0.2.1:9999".parse().unwrap(),
            timeout: Duration::from_millis(100),
        });

        let result = transport.post("/check_access", String::new()).await;
        assert!(matches!(
            result,
            Err(AuthzError::ConnectionTimeout(_) | AuthzError::Io(_))
        ));
    }
}
