use crate::{
    Result,
    constants::{MAX_UID_LENGTH, MIN_UID_LENGTH},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// A single tag detection, produced by the card reader on a presence edge.
///
/// Exactly one `TagEvent` is emitted per physical presentation of a tag:
/// the reader debounces by presence change, not by serial value, so a tag
/// held in the field does not re-trigger the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagEvent {
    /// Raw reader UID, zero-extended most-significant-byte-first into a u64.
    pub serial_number: u64,

    /// Monotonic timestamp of the detection.
    pub observed_at: Instant,
}

impl TagEvent {
    /// Create a tag event observed now.
    pub fn new(serial_number: u64) -> Self {
        Self {
            serial_number,
            observed_at: Instant::now(),
        }
    }

    /// Build a tag event from a raw UID as read off the wire.
    ///
    /// The UID bytes are folded most-significant-first into a u64. UIDs
    /// longer than 8 bytes use only their first 8 bytes, matching the
    /// transport/storage width of the serial number.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUid` if the UID length is outside the 4-10
    /// byte range allowed by ISO 14443.
    ///
    /// # Examples
    ///
    /// ```
    /// use gatekeeper_core::TagEvent;
    ///
    /// let event = TagEvent::from_uid(&[0x01, 0x02, 0x03, 0x04]).unwrap();
    /// assert_eq!(event.serial_number, 0x0102_0304);
    /// ```
    pub fn from_uid(uid: &[u8]) -> Result<Self> {
        if !(MIN_UID_LENGTH..=MAX_UID_LENGTH).contains(&uid.len()) {
            return Err(Error::InvalidUid(format!(
                "UID must be {MIN_UID_LENGTH}-{MAX_UID_LENGTH} bytes, got {}",
                uid.len()
            )));
        }

        let mut serial = 0u64;
        for byte in &uid[..uid.len().min(8)] {
            serial = (serial << 8) | u64::from(*byte);
        }

        Ok(Self::new(serial))
    }
}

/// Outcome of one authorization attempt against the remote endpoint.
///
/// `Denied`, `TimedOut` and `TransportError` all actuate as a denial; the
/// distinct kind is preserved for the audit trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationResult {
    /// Endpoint answered with a grant verdict.
    Granted,

    /// Endpoint answered with anything other than a grant verdict.
    Denied,

    /// No answer arrived before the deadline; the request was abandoned.
    TimedOut,

    /// The request could not be completed at the transport level.
    TransportError(String),
}

impl AuthorizationResult {
    /// Reduce the result to the physical actuation decision.
    ///
    /// A denied access from a timeout is indistinguishable at the door from
    /// an explicit refusal; only the audit trail tells them apart.
    pub fn reduce(&self) -> AccessDecision {
        match self {
            Self::Granted => AccessDecision::Granted,
            Self::Denied | Self::TimedOut | Self::TransportError(_) => AccessDecision::Denied,
        }
    }

    /// The kind recorded in the audit trail.
    pub fn kind(&self) -> ResultKind {
        match self {
            Self::Granted => ResultKind::Granted,
            Self::Denied => ResultKind::Denied,
            Self::TimedOut => ResultKind::TimedOut,
            Self::TransportError(_) => ResultKind::TransportError,
        }
    }
}

impl fmt::Display for AuthorizationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Granted => write!(f, "granted"),
            Self::Denied => write!(f, "denied"),
            Self::TimedOut => write!(f, "timed out"),
            Self::TransportError(reason) => write!(f, "transport error: {reason}"),
        }
    }
}

/// The reduced decision the actuation sequencer acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDecision {
    Granted,
    Denied,
}

impl fmt::Display for AccessDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Granted => write!(f, "granted"),
            Self::Denied => write!(f, "denied"),
        }
    }
}

/// Result kind as persisted in an audit slot.
///
/// The byte values are part of the storage format; do not renumber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ResultKind {
    Granted = 0x01,
    Denied = 0x02,
    TimedOut = 0x03,
    TransportError = 0x04,
}

impl ResultKind {
    /// Storage encoding of this kind.
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Decode a kind byte read back from storage.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::Granted),
            0x02 => Some(Self::Denied),
            0x03 => Some(Self::TimedOut),
            0x04 => Some(Self::TransportError),
            _ => None,
        }
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Granted => write!(f, "granted"),
            Self::Denied => write!(f, "denied"),
            Self::TimedOut => write!(f, "timed_out"),
            Self::TransportError => write!(f, "transport_error"),
        }
    }
}

/// One committed audit entry: exactly one per tag event.
///
/// The controller is the sole writer; records are overwritten in circular
/// order, so no record survives more than `AUDIT_SLOT_COUNT` later events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Serial number of the tag that triggered the event.
    pub serial_number: u64,

    /// Distinct outcome kind, preserved even though timeouts and transport
    /// faults actuate identically to a denial.
    pub result_kind: ResultKind,

    /// Byte address of the slot this record occupies.
    pub slot_address: u16,
}
