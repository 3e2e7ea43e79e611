//! Error types for transport operations.

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors that can occur while talking to an ANT radio.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The radio is gone or its channel to us has closed.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Opening the serial port failed.
    #[error("Failed to open {port}: {source}")]
    OpenFailed {
        port: String,
        #[source]
        source: serialport::Error,
    },

    /// Serial port configuration error.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A blocking I/O task was cancelled or panicked.
    #[error("I/O task failed: {message}")]
    TaskFailed { message: String },
}

impl TransportError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new open-failed error.
    pub fn open_failed(port: impl Into<String>, source: serialport::Error) -> Self {
        Self::OpenFailed {
            port: port.into(),
            source,
        }
    }

    /// Create a new task-failed error.
    pub fn task_failed(message: impl Into<String>) -> Self {
        Self::TaskFailed {
            message: message.into(),
        }
    }
}
