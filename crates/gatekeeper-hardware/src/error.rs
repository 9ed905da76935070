//! Error types for hardware operations.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware device operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// A bus transaction did not complete.
    ///
    /// For the card reader this is indistinguishable from "no tag present"
    /// and is absorbed by the driver; for storage it surfaces to the caller.
    #[error("Bus transaction failed: {message}")]
    BusTransaction { message: String },

    /// Caller passed an argument outside the device's contract
    /// (oversized page write, duty cycle outside 0.0-1.0). Fatal to the
    /// call, never retried.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    /// Create a new bus transaction error.
    pub fn bus(message: impl Into<String>) -> Self {
        Self::BusTransaction {
            message: message.into(),
        }
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }
}

impl From<HardwareError> for gatekeeper_core::Error {
    fn from(err: HardwareError) -> Self {
        match err {
            HardwareError::BusTransaction { message } => Self::BusTransaction(message),
            HardwareError::InvalidArgument { message } => Self::InvalidArgument(message),
            HardwareError::Disconnected { device } => Self::BusTransaction(format!(
                "device disconnected: {device}"
            )),
            HardwareError::Io(err) => Self::Io(err),
        }
    }
}
