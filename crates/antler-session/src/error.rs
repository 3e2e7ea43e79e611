//! Error types for ANT-FS session operations.

use antler_protocol::DownloadResponse;

use crate::state::SessionState;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors that can occur while running an ANT-FS session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The engine underneath failed (transport loss, timeout, rejection).
    #[error(transparent)]
    Engine(#[from] antler_engine::EngineError),

    /// An answer structure could not be parsed.
    #[error(transparent)]
    Protocol(#[from] antler_core::Error),

    /// An operation ran out of attempts.
    #[error("{operation} failed after {attempts} attempts")]
    RetriesExhausted {
        operation: &'static str,
        attempts: u32,
    },

    /// An operation was called in the wrong session state.
    #[error("{operation} requires state {required}, session is {actual}")]
    InvalidState {
        operation: &'static str,
        required: SessionState,
        actual: SessionState,
    },

    /// The device rejected an authentication exchange.
    #[error("Device rejected {operation}")]
    Rejected { operation: &'static str },

    /// The device refused a download request.
    #[error("Download refused: {}", response.describe())]
    DownloadRefused { response: DownloadResponse },
}

impl SessionError {
    /// Whether another attempt of the same operation could help.
    ///
    /// RF failures and quiet timeouts are worth retrying; a dead engine,
    /// a parse failure, or an explicit rejection is not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Engine(
                antler_engine::EngineError::TransferFailed { .. }
                    | antler_engine::EngineError::Timeout { .. }
            )
        )
    }
}
