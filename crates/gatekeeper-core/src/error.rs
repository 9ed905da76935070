use thiserror::Error;

/// Errors shared across the access pipeline.
///
/// Driver crates define their own error enums and convert into this one at
/// the controller boundary. Driver-level faults never unwind past the
/// controller: the state machine always completes and returns to `Idle`.
#[derive(Error, Debug)]
pub enum Error {
    // Bus / driver faults
    #[error("Bus transaction failed: {0}")]
    BusTransaction(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Tag / event faults
    #[error("Invalid tag UID: {0}")]
    InvalidUid(String),

    // Storage faults
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Corrupt audit record at slot {slot_address:#06x}: {message}")]
    CorruptRecord { slot_address: u16, message: String },

    // Authorization faults
    #[error("Authorization transport error: {0}")]
    Transport(String),

    #[error("Authorization deadline elapsed")]
    DeadlineElapsed,

    // State machine faults
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
