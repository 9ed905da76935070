use gatekeeper_hardware::HardwareError;
use thiserror::Error;

/// Storage-specific error types.
///
/// Audit logging is best-effort in the pipeline: the controller logs these
/// and returns to idle, it never lets them halt the event loop.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying bus transaction failed
    #[error("Bus error: {0}")]
    Bus(#[from] HardwareError),

    /// Caller violated a device constraint; fatal to the call, not retried
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A record read back from the ring does not decode
    #[error("Corrupt record at slot {slot_address:#06x}: {message}")]
    CorruptRecord { slot_address: u16, message: String },

    /// Ring configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Specialized result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for gatekeeper_core::Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Bus(inner) => inner.into(),
            StorageError::InvalidArgument(message) => Self::InvalidArgument(message),
            StorageError::CorruptRecord {
                slot_address,
                message,
            } => Self::CorruptRecord {
                slot_address,
                message,
            },
            StorageError::Configuration(message) => Self::Config(message),
        }
    }
}
