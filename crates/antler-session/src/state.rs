//! Session state tracking.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where the session stands with the client device.
///
/// Operations gate on this: linking needs `Disconnected`, identity and
/// authentication exchanges need `Linked`, downloads need `Transport`.
/// Disconnecting is legal from anywhere and always lands back in
/// `Disconnected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No link: the client (if any) is broadcasting on the search channel.
    Disconnected,

    /// Link established: the client follows our channel and accepts
    /// authentication commands.
    Linked,

    /// Authenticated: the client accepts download requests.
    Transport,
}

impl SessionState {
    /// Human-readable name for logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Linked => "Linked",
            Self::Transport => "Transport",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
