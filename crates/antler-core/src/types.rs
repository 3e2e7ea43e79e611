//! Protocol enumerations: message ids, event codes, and device states.
//!
//! The numeric values here come from the vendor protocol and are part of the
//! external contract; the enums exist so the rest of the codebase never
//! mentions a raw id twice.

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Message Ids
// ============================================================================

/// ANT message id, the third byte of every frame.
///
/// Host-to-device ids cover channel configuration and data transmission.
/// Device-to-host frames reuse the data ids for received data and add
/// [`MessageId::ResponseEvent`] for command/RF event reporting.
///
/// # Examples
///
/// ```
/// use antler_core::types::MessageId;
///
/// assert_eq!(MessageId::from_u8(0x4A), Some(MessageId::ResetSystem));
/// assert_eq!(MessageId::ResetSystem.as_u8(), 0x4A);
/// assert_eq!(MessageId::from_u8(0x99), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageId {
    /// Pseudo-id carried inside response frames for RF channel events
    /// (search timeout, transfer completion, and the like) that are not
    /// answers to any one command.
    ChannelEvent = 0x01,
    /// Response to a channel command: payload is `[channel, responded-to id, code]`.
    ResponseEvent = 0x40,
    UnassignChannel = 0x41,
    AssignChannel = 0x42,
    SetChannelPeriod = 0x43,
    SetChannelSearchTimeout = 0x44,
    SetChannelRadioFreq = 0x45,
    SetNetworkKey = 0x46,
    SetSearchWaveform = 0x49,
    ResetSystem = 0x4A,
    OpenChannel = 0x4B,
    CloseChannel = 0x4C,
    RequestMessage = 0x4D,
    SendBroadcastData = 0x4E,
    SendAcknowledgedData = 0x4F,
    SendBurstTransferPacket = 0x50,
    SetChannelId = 0x51,
    ChannelStatus = 0x52,
    Capabilities = 0x54,
}

impl MessageId {
    /// Parse a raw id byte.
    ///
    /// Returns `None` for ids this implementation does not know; callers log
    /// and skip those frames rather than failing.
    pub fn from_u8(id: u8) -> Option<Self> {
        match id {
            0x01 => Some(Self::ChannelEvent),
            0x40 => Some(Self::ResponseEvent),
            0x41 => Some(Self::UnassignChannel),
            0x42 => Some(Self::AssignChannel),
            0x43 => Some(Self::SetChannelPeriod),
            0x44 => Some(Self::SetChannelSearchTimeout),
            0x45 => Some(Self::SetChannelRadioFreq),
            0x46 => Some(Self::SetNetworkKey),
            0x49 => Some(Self::SetSearchWaveform),
            0x4A => Some(Self::ResetSystem),
            0x4B => Some(Self::OpenChannel),
            0x4C => Some(Self::CloseChannel),
            0x4D => Some(Self::RequestMessage),
            0x4E => Some(Self::SendBroadcastData),
            0x4F => Some(Self::SendAcknowledgedData),
            0x50 => Some(Self::SendBurstTransferPacket),
            0x51 => Some(Self::SetChannelId),
            0x52 => Some(Self::ChannelStatus),
            0x54 => Some(Self::Capabilities),
            _ => None,
        }
    }

    /// The raw wire value.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Human-readable name for logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::ChannelEvent => "ChannelEvent",
            Self::ResponseEvent => "ResponseEvent",
            Self::UnassignChannel => "UnassignChannel",
            Self::AssignChannel => "AssignChannel",
            Self::SetChannelPeriod => "SetChannelPeriod",
            Self::SetChannelSearchTimeout => "SetChannelSearchTimeout",
            Self::SetChannelRadioFreq => "SetChannelRadioFreq",
            Self::SetNetworkKey => "SetNetworkKey",
            Self::SetSearchWaveform => "SetSearchWaveform",
            Self::ResetSystem => "ResetSystem",
            Self::OpenChannel => "OpenChannel",
            Self::CloseChannel => "CloseChannel",
            Self::RequestMessage => "RequestMessage",
            Self::SendBroadcastData => "SendBroadcastData",
            Self::SendAcknowledgedData => "SendAcknowledgedData",
            Self::SendBurstTransferPacket => "SendBurstTransferPacket",
            Self::SetChannelId => "SetChannelId",
            Self::ChannelStatus => "ChannelStatus",
            Self::Capabilities => "Capabilities",
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Event Codes
// ============================================================================

/// Code byte of a response/event frame.
///
/// [`EventCode::ResponseNoError`] acknowledges a command; the rest report RF
/// channel events. Codes this implementation has no name for are preserved in
/// [`EventCode::Other`] so they can still be logged and matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCode {
    ResponseNoError,
    RxSearchTimeout,
    RxFail,
    Tx,
    TransferRxFailed,
    TransferTxCompleted,
    TransferTxFailed,
    ChannelClosed,
    RxFailGoToSearch,
    ChannelCollision,
    TransferTxStart,
    ChannelInWrongState,
    ChannelNotOpened,
    TransferSequenceError,
    InvalidMessage,
    Other(u8),
}

impl EventCode {
    /// Parse a raw code byte. Total: unknown codes map to [`EventCode::Other`].
    pub fn from_u8(code: u8) -> Self {
        match code {
            0x00 => Self::ResponseNoError,
            0x01 => Self::RxSearchTimeout,
            0x02 => Self::RxFail,
            0x03 => Self::Tx,
            0x04 => Self::TransferRxFailed,
            0x05 => Self::TransferTxCompleted,
            0x06 => Self::TransferTxFailed,
            0x07 => Self::ChannelClosed,
            0x08 => Self::RxFailGoToSearch,
            0x09 => Self::ChannelCollision,
            0x0A => Self::TransferTxStart,
            0x15 => Self::ChannelInWrongState,
            0x16 => Self::ChannelNotOpened,
            0x20 => Self::TransferSequenceError,
            0x28 => Self::InvalidMessage,
            other => Self::Other(other),
        }
    }

    /// The raw wire value.
    pub fn as_u8(self) -> u8 {
        match self {
            Self::ResponseNoError => 0x00,
            Self::RxSearchTimeout => 0x01,
            Self::RxFail => 0x02,
            Self::Tx => 0x03,
            Self::TransferRxFailed => 0x04,
            Self::TransferTxCompleted => 0x05,
            Self::TransferTxFailed => 0x06,
            Self::ChannelClosed => 0x07,
            Self::RxFailGoToSearch => 0x08,
            Self::ChannelCollision => 0x09,
            Self::TransferTxStart => 0x0A,
            Self::ChannelInWrongState => 0x15,
            Self::ChannelNotOpened => 0x16,
            Self::TransferSequenceError => 0x20,
            Self::InvalidMessage => 0x28,
            Self::Other(code) => code,
        }
    }

    /// Whether this code aborts an in-progress wait.
    ///
    /// These are the reception/transmission failures; timeouts and collisions
    /// are transient and waits ride through them.
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            Self::RxFail | Self::TransferRxFailed | Self::TransferTxFailed
        )
    }

    /// Human-readable name for logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::ResponseNoError => "RESPONSE_NO_ERROR",
            Self::RxSearchTimeout => "EVENT_RX_SEARCH_TIMEOUT",
            Self::RxFail => "EVENT_RX_FAIL",
            Self::Tx => "EVENT_TX",
            Self::TransferRxFailed => "EVENT_TRANSFER_RX_FAILED",
            Self::TransferTxCompleted => "EVENT_TRANSFER_TX_COMPLETED",
            Self::TransferTxFailed => "EVENT_TRANSFER_TX_FAILED",
            Self::ChannelClosed => "EVENT_CHANNEL_CLOSED",
            Self::RxFailGoToSearch => "EVENT_RX_FAIL_GO_TO_SEARCH",
            Self::ChannelCollision => "EVENT_CHANNEL_COLLISION",
            Self::TransferTxStart => "EVENT_TRANSFER_TX_START",
            Self::ChannelInWrongState => "CHANNEL_IN_WRONG_STATE",
            Self::ChannelNotOpened => "CHANNEL_NOT_OPENED",
            Self::TransferSequenceError => "TRANSFER_SEQUENCE_NUMBER_ERROR",
            Self::InvalidMessage => "INVALID_MESSAGE",
            Self::Other(_) => "UNKNOWN_EVENT",
        }
    }
}

impl fmt::Display for EventCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other(code) => write!(f, "UNKNOWN_EVENT(0x{code:02X})"),
            _ => write!(f, "{}", self.name()),
        }
    }
}

// ============================================================================
// Channel and Device States
// ============================================================================

/// Assignment type for a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelType {
    /// Slave channel: receives broadcasts from a master (the usual host role).
    Receive,
    /// Master channel: transmits broadcasts.
    Transmit,
}

impl ChannelType {
    /// The raw wire value.
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Receive => 0x00,
            Self::Transmit => 0x10,
        }
    }
}

/// Channel state as reported by a channel-status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelState {
    Unassigned,
    Assigned,
    Searching,
    Tracking,
}

impl ChannelState {
    /// Decode the state bits of a status byte.
    ///
    /// Only the low two bits carry the state; the rest of the byte holds
    /// network and type flags that callers do not need.
    pub fn from_status_byte(status: u8) -> Self {
        match status & 0x03 {
            0 => Self::Unassigned,
            1 => Self::Assigned,
            2 => Self::Searching,
            _ => Self::Tracking,
        }
    }

    /// Human-readable name for logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Unassigned => "Unassigned",
            Self::Assigned => "Assigned",
            Self::Searching => "Searching",
            Self::Tracking => "Tracking",
        }
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// ANT-FS client device state, advertised in every beacon.
///
/// The session layer gates its operations on this: link commands make sense
/// against a client in `Link`, authentication against `Authentication`, and
/// downloads against `Transport`. `Busy` means back off and keep listening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClientState {
    Link,
    Authentication,
    Transport,
    Busy,
}

impl ClientState {
    /// Parse the state nibble of beacon status byte 2.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Link),
            1 => Some(Self::Authentication),
            2 => Some(Self::Transport),
            3 => Some(Self::Busy),
            _ => None,
        }
    }

    /// Human-readable name for logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Link => "Link",
            Self::Authentication => "Authentication",
            Self::Transport => "Transport",
            Self::Busy => "Busy",
        }
    }
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Authentication scheme a client advertises in its beacon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthType {
    /// No authentication required.
    PassThrough,
    /// Not available for client devices.
    NotAvailable,
    /// Pairing only.
    PairingOnly,
    /// Passkey exchange and pairing.
    PasskeyAndPairing,
}

impl AuthType {
    /// Parse the beacon authentication-type byte.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::PassThrough),
            1 => Some(Self::NotAvailable),
            2 => Some(Self::PairingOnly),
            3 => Some(Self::PasskeyAndPairing),
            _ => None,
        }
    }

    /// Human-readable name for logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::PassThrough => "Pass-through",
            Self::NotAvailable => "N/A",
            Self::PairingOnly => "Pairing only",
            Self::PasskeyAndPairing => "Passkey and pairing",
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Beacon channel period, the low three bits of beacon status byte 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeaconPeriod {
    Hz0_5,
    Hz1,
    Hz2,
    Hz4,
    Hz8,
    Reserved5,
    Reserved6,
    /// Keep the period the channel was established with.
    Established,
}

impl BeaconPeriod {
    /// Decode the period bits. Total over the three-bit field.
    pub fn from_u8(value: u8) -> Self {
        match value & 0x07 {
            0 => Self::Hz0_5,
            1 => Self::Hz1,
            2 => Self::Hz2,
            3 => Self::Hz4,
            4 => Self::Hz8,
            5 => Self::Reserved5,
            6 => Self::Reserved6,
            _ => Self::Established,
        }
    }

    /// The raw wire value.
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Hz0_5 => 0,
            Self::Hz1 => 1,
            Self::Hz2 => 2,
            Self::Hz4 => 3,
            Self::Hz8 => 4,
            Self::Reserved5 => 5,
            Self::Reserved6 => 6,
            Self::Established => 7,
        }
    }

    /// Human-readable name for logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Hz0_5 => "0.5 Hz",
            Self::Hz1 => "1 Hz",
            Self::Hz2 => "2 Hz",
            Self::Hz4 => "4 Hz",
            Self::Hz8 => "8 Hz",
            Self::Reserved5 | Self::Reserved6 => "Reserved",
            Self::Established => "Match established period",
        }
    }
}

impl fmt::Display for BeaconPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
