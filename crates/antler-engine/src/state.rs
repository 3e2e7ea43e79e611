//! Shared protocol state, updated by the parser as frames arrive.

use std::sync::{Arc, Mutex};

use antler_core::types::{ChannelState, ClientState, EventCode};
use antler_protocol::Beacon;

/// Last-seen radio and client state.
///
/// The parser task writes this on every relevant frame; wait primitives and
/// the session layer read it to make gating decisions without consuming
/// events. Guarded by a plain [`std::sync::Mutex`]: updates are tiny and the
/// lock is never held across an await.
#[derive(Debug, Default)]
pub struct ProtocolState {
    /// Last command response seen: responded-to id and its code.
    pub last_response: Option<(u8, EventCode)>,

    /// Channel state from the most recent channel-status message.
    pub channel_state: Option<ChannelState>,

    /// Client state from the most recent ANT-FS beacon.
    pub client_state: Option<ClientState>,

    /// The most recent ANT-FS beacon in full.
    pub last_beacon: Option<Beacon>,
}

/// Cheaply cloneable handle to a [`ProtocolState`].
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    inner: Arc<Mutex<ProtocolState>>,
}

impl SharedState {
    /// Create a fresh, empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a snapshot through a closure.
    pub fn with<R>(&self, f: impl FnOnce(&ProtocolState) -> R) -> R {
        f(&self.inner.lock().expect("state lock poisoned"))
    }

    /// Mutate through a closure.
    pub(crate) fn update(&self, f: impl FnOnce(&mut ProtocolState)) {
        f(&mut self.inner.lock().expect("state lock poisoned"));
    }

    /// Current client state, if a beacon has been seen.
    pub fn client_state(&self) -> Option<ClientState> {
        self.with(|s| s.client_state)
    }

    /// Current channel state, if a status message has been seen.
    pub fn channel_state(&self) -> Option<ChannelState> {
        self.with(|s| s.channel_state)
    }

    /// The most recent ANT-FS beacon.
    pub fn last_beacon(&self) -> Option<Beacon> {
        self.with(|s| s.last_beacon)
    }
}
