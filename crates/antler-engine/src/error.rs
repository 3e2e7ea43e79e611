//! Error types for the engine layer.

use antler_core::types::EventCode;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while driving an ANT radio.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The byte link to the radio failed.
    #[error(transparent)]
    Transport(#[from] antler_transport::TransportError),

    /// A frame or wire structure could not be decoded.
    #[error(transparent)]
    Protocol(#[from] antler_core::Error),

    /// Nothing matching arrived in time.
    #[error("Timed out after {duration_ms}ms waiting for {waiting_for}")]
    Timeout {
        waiting_for: &'static str,
        duration_ms: u64,
    },

    /// The radio answered a command with something other than
    /// `RESPONSE_NO_ERROR`.
    #[error("Command 0x{id:02X} rejected: {code}")]
    CommandRejected { id: u8, code: EventCode },

    /// An RF event reported a failed transfer while a wait was in progress.
    #[error("Transfer failed: {code}")]
    TransferFailed { code: EventCode },

    /// The engine's background tasks are gone.
    #[error("Engine stopped")]
    Stopped,
}

impl EngineError {
    /// Create a new timeout error.
    pub fn timeout(waiting_for: &'static str, duration: std::time::Duration) -> Self {
        Self::Timeout {
            waiting_for,
            duration_ms: duration.as_millis() as u64,
        }
    }
}
