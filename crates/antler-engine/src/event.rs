//! Events produced by the ingest pipeline.

use bytes::Bytes;

use antler_core::types::EventCode;
use antler_protocol::Beacon;

/// One decoded unit from the radio, ready for a wait primitive to match.
///
/// The parser collapses the frame stream into these: command responses and
/// RF events, broadcast data (with the ANT-FS beacon pre-parsed when one is
/// present), fully reassembled bursts, and everything else as a raw message.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum AntEvent {
    /// Response/event frame: `id` is the responded-to message id, or `0x01`
    /// for RF channel events.
    Response { id: u8, code: EventCode },

    /// Broadcast data payload (channel byte stripped).
    ///
    /// `beacon` is populated when the payload parses as an ANT-FS beacon,
    /// which the session layer matches on; HRM pages arrive with `None` and
    /// are decoded by the consumer.
    Broadcast {
        payload: Bytes,
        beacon: Option<Beacon>,
    },

    /// A complete reassembled burst transfer (headers stripped).
    Burst { data: Bytes },

    /// Any other frame, passed through undecoded.
    Message { id: u8, payload: Bytes },
}

impl AntEvent {
    /// Whether this is an RF event reporting a failed transfer.
    pub fn is_transfer_failure(&self) -> Option<EventCode> {
        match self {
            Self::Response { code, .. } if code.is_failure() => Some(*code),
            _ => None,
        }
    }
}
