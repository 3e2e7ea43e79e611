//! Burst transfer packetization and reassembly.
//!
//! A burst moves a payload larger than one frame as a train of
//! [`MessageId::SendBurstTransferPacket`] frames. Each frame carries a header
//! byte followed by up to eight data bytes:
//!
//! ```text
//! bit 7    bits 6..5    bits 4..0
//! last     sequence     channel
//! ```
//!
//! The first packet of a burst carries sequence 0; subsequent packets cycle
//! 1, 2, 3, 1, 2, 3... (0 never repeats within one burst). The packet with
//! the `last` bit set ends the burst.

use bytes::{BufMut, Bytes, BytesMut};

use antler_core::types::MessageId;
use antler_core::{Error, Result};

use crate::frame::AntMessage;

/// Data bytes carried per burst packet.
pub const BURST_CHUNK_SIZE: usize = 8;

/// Decoded burst packet header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurstHeader {
    /// Channel number (5 bits).
    pub channel: u8,
    /// Cyclic sequence number (2 bits).
    pub sequence: u8,
    /// Whether this packet ends the burst.
    pub last: bool,
}

impl BurstHeader {
    /// Pack into the wire byte.
    pub fn as_u8(self) -> u8 {
        (self.channel & 0x1F) | ((self.sequence & 0x03) << 5) | if self.last { 0x80 } else { 0x00 }
    }

    /// Unpack from the wire byte.
    pub fn from_u8(byte: u8) -> Self {
        Self {
            channel: byte & 0x1F,
            sequence: (byte >> 5) & 0x03,
            last: byte & 0x80 != 0,
        }
    }
}

/// Split a payload into the burst packet train for a channel.
///
/// Chunks are [`BURST_CHUNK_SIZE`] bytes; the final chunk may be shorter and
/// carries the `last` flag. An empty payload produces no packets.
///
/// # Examples
///
/// ```
/// use antler_protocol::burst::{burst_packets, BurstHeader};
///
/// let packets = burst_packets(0, &[0u8; 20]);
/// assert_eq!(packets.len(), 3);
///
/// let first = BurstHeader::from_u8(packets[0].payload()[0]);
/// let final_ = BurstHeader::from_u8(packets[2].payload()[0]);
/// assert_eq!(first.sequence, 0);
/// assert!(!first.last);
/// assert!(final_.last);
/// ```
pub fn burst_packets(channel: u8, payload: &[u8]) -> Vec<AntMessage> {
    let mut packets = Vec::with_capacity(payload.len().div_ceil(BURST_CHUNK_SIZE));
    let mut sequence: u8 = 0;

    let chunk_count = payload.chunks(BURST_CHUNK_SIZE).count();
    for (i, chunk) in payload.chunks(BURST_CHUNK_SIZE).enumerate() {
        let header = BurstHeader {
            channel,
            sequence,
            last: i + 1 == chunk_count,
        };

        let mut data = BytesMut::with_capacity(1 + chunk.len());
        data.put_u8(header.as_u8());
        data.put_slice(chunk);
        packets.push(AntMessage::new(
            MessageId::SendBurstTransferPacket,
            data.freeze(),
        ));

        sequence += 1;
        if sequence > 3 {
            sequence = 1;
        }
    }

    packets
}

/// Reassembles a burst from its packet payloads in arrival order.
///
/// Fed with the payload of each `SendBurstTransferPacket` frame (header byte
/// included); yields the concatenated data once the `last`-flagged packet
/// arrives. The radio delivers burst packets in order or fails the transfer
/// with an event, so sequence numbers are decoded for logging but a gap is
/// not detected here.
#[derive(Debug, Default)]
pub struct BurstAssembler {
    data: BytesMut,
}

impl BurstAssembler {
    /// Create an empty assembler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard anything accumulated so far.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Feed one burst packet payload.
    ///
    /// Returns the complete burst when this packet carried the `last` flag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Truncated`] for a packet without even a header byte.
    pub fn push(&mut self, packet_payload: &[u8]) -> Result<Option<Bytes>> {
        let Some((&header_byte, data)) = packet_payload.split_first() else {
            return Err(Error::truncated("burst packet", 1, 0));
        };

        let header = BurstHeader::from_u8(header_byte);
        self.data.put_slice(data);

        if header.last {
            Ok(Some(self.data.split().freeze()))
        } else {
            Ok(None)
        }
    }
}
