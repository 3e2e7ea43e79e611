//! Core constants for the ANT serial protocol and its ANT-FS session layer.
//!
//! # Frame structure
//!
//! Every message on the serial link is framed the same way:
//!
//! ```text
//! <SYNC> <LEN> <ID> <PAYLOAD ...> <CHK>
//! ```
//!
//! Where:
//! - `<SYNC>` - Frame marker (0xA4 host-to-device, 0xA5 device-to-host)
//! - `<LEN>` - Payload length in bytes (0-255)
//! - `<ID>` - Message id (see [`crate::types::MessageId`])
//! - `<PAYLOAD>` - `LEN` payload bytes
//! - `<CHK>` - XOR of every preceding byte; XOR over the whole frame
//!   including `<CHK>` is zero for a valid frame
//!
//! # Channel profiles
//!
//! The ANT-FS and ANT+ heart-rate constants below are the published network
//! parameters for those device classes. They are radio configuration, not
//! tunables: changing them means the watch will never be found.

use std::time::Duration;

// ============================================================================
// Frame Markers
// ============================================================================

/// Sync byte opening every frame sent by the host.
///
/// # Examples
///
/// ```
/// use antler_core::constants::SYNC_TX;
///
/// let frame = [SYNC_TX, 0x01, 0x4A, 0x00, 0xEF];
/// assert_eq!(frame[0], 0xA4);
/// ```
pub const SYNC_TX: u8 = 0xA4;

/// Sync byte opening frames sent by some device firmware revisions.
///
/// Most devices echo [`SYNC_TX`]; the decoder accepts either.
pub const SYNC_RX: u8 = 0xA5;

/// Maximum payload length a frame can carry.
///
/// The length field is a single byte, so this is a hard protocol limit.
pub const MAX_PAYLOAD_SIZE: usize = 255;

/// Bytes of framing around the payload (sync + length + id + checksum).
pub const FRAME_OVERHEAD: usize = 4;

/// Largest possible encoded frame.
pub const MAX_FRAME_SIZE: usize = MAX_PAYLOAD_SIZE + FRAME_OVERHEAD;

// ============================================================================
// Network Defaults
// ============================================================================

/// Network number used for single-network configurations.
pub const DEFAULT_NETWORK: u8 = 0;

/// Host serial number presented to the client during linking.
///
/// Any non-zero value works; the device only echoes it back in answers.
pub const DEFAULT_HOST_SERIAL: u32 = 0x1;

// ============================================================================
// ANT-FS Channel Profile
// ============================================================================

/// ANT-FS network key.
pub const ANTFS_NETWORK_KEY: [u8; 8] = [0xA8, 0xA4, 0x23, 0xB9, 0xF5, 0x5E, 0x63, 0xC1];

/// ANT-FS RF frequency offset from 2400 MHz (2450 MHz).
pub const ANTFS_RF_FREQUENCY: u8 = 50;

/// ANT-FS channel message period (32768 / 4096 = 8 Hz).
pub const ANTFS_CHANNEL_PERIOD: u16 = 4096;

/// ANT-FS search timeout (0xFF = search forever).
pub const ANTFS_SEARCH_TIMEOUT: u8 = 0xFF;

/// ANT-FS search waveform value.
pub const ANTFS_SEARCH_WAVEFORM: u16 = 83;

// ============================================================================
// ANT+ Heart-Rate Channel Profile
// ============================================================================

/// ANT+ managed network key.
pub const ANT_PLUS_NETWORK_KEY: [u8; 8] = [0xB9, 0xA5, 0x21, 0xFB, 0xBD, 0x72, 0xC3, 0x45];

/// ANT+ RF frequency offset from 2400 MHz (2457 MHz).
pub const HRM_RF_FREQUENCY: u8 = 57;

/// Heart-rate monitor channel message period (32768 / 8070 ≈ 4.06 Hz).
pub const HRM_CHANNEL_PERIOD: u16 = 8070;

/// Heart-rate monitor search timeout, in 2.5 s units.
pub const HRM_SEARCH_TIMEOUT: u8 = 5;

/// ANT+ device type for heart-rate monitors.
pub const HRM_DEVICE_TYPE: u8 = 0x78;

// ============================================================================
// Timing
// ============================================================================

/// Pause after each burst packet so the radio can drain its transmit queue.
///
/// Sent back-to-back, packets past the first get dropped by the dongle.
pub const BURST_PACKET_INTERVAL: Duration = Duration::from_millis(60);

/// Settle time after a system reset.
///
/// The dongle does not answer the reset command; it just reboots. Commands
/// sent before this window elapses are lost.
pub const RESET_SETTLE_TIME: Duration = Duration::from_millis(500);

/// Default timeout for a single transport read.
///
/// Reads are chunked at this interval so shutdown is observed promptly even
/// when the device goes quiet.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

// ============================================================================
// Session Defaults
// ============================================================================

/// Default attempt budget for retried session operations.
///
/// # Value: 5 attempts
///
/// Applies to link, serial-number request, pairing, and authenticate.
/// Download is not retried; see the session crate.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_size_relation() {
        assert_eq!(MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE + FRAME_OVERHEAD);
    }

    #[test]
    fn test_network_keys_are_distinct() {
        assert_ne!(ANTFS_NETWORK_KEY, ANT_PLUS_NETWORK_KEY);
        assert_eq!(ANTFS_NETWORK_KEY.len(), 8);
        assert_eq!(ANT_PLUS_NETWORK_KEY.len(), 8);
    }

    #[test]
    fn test_burst_interval() {
        assert_eq!(BURST_PACKET_INTERVAL.as_millis(), 60);
    }
}
