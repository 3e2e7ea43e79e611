//! Byte-level ANT message framing.
//!
//! Every message on the serial link, in either direction, is wrapped in the
//! same envelope:
//!
//! ```text
//! <SYNC> <LEN> <ID> <PAYLOAD ...> <CHK>
//! ```
//!
//! `CHK` is the XOR of every preceding byte, so XOR over a complete frame
//! including the checksum is zero. The stream is self-synchronizing: decoding
//! scans forward to the next sync byte, which lets the parser recover after
//! line noise or a partial read.

use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use antler_core::constants::{FRAME_OVERHEAD, MAX_PAYLOAD_SIZE, SYNC_RX, SYNC_TX};
use antler_core::types::MessageId;
use antler_core::{Error, Result};

/// XOR of all bytes in a slice.
///
/// Used both to produce the trailing checksum byte on encode and to verify a
/// received frame (a valid frame XORs to zero, checksum included).
pub fn xor_checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc ^ b)
}

/// A single ANT message: id plus payload, framing stripped.
///
/// The id is kept as a raw byte so frames with ids this implementation does
/// not know still flow through the pipeline (they are logged and skipped, not
/// dropped as errors). [`AntMessage::message_id`] gives the typed view.
///
/// # Examples
///
/// ```
/// use antler_protocol::frame::AntMessage;
/// use antler_core::types::MessageId;
///
/// let msg = AntMessage::new(MessageId::ResetSystem, vec![0x00]);
/// let wire = msg.encode().unwrap();
/// assert_eq!(&wire[..], &[0xA4, 0x01, 0x4A, 0x00, 0xEF]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AntMessage {
    id: u8,
    payload: Bytes,
}

impl AntMessage {
    /// Create a message with a known id.
    pub fn new(id: MessageId, payload: impl Into<Bytes>) -> Self {
        Self {
            id: id.as_u8(),
            payload: payload.into(),
        }
    }

    /// Create a message from a raw id byte.
    pub fn from_raw(id: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            id,
            payload: payload.into(),
        }
    }

    /// The raw message id byte.
    pub fn id(&self) -> u8 {
        self.id
    }

    /// The typed message id, if this implementation knows it.
    pub fn message_id(&self) -> Option<MessageId> {
        MessageId::from_u8(self.id)
    }

    /// The payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Consume the message, keeping only the payload.
    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// Encode into a complete frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PayloadTooLarge`] if the payload exceeds the 255-byte
    /// limit of the one-byte length field.
    pub fn encode(&self) -> Result<Bytes> {
        if self.payload.len() > MAX_PAYLOAD_SIZE {
            return Err(Error::PayloadTooLarge {
                size: self.payload.len(),
                max: MAX_PAYLOAD_SIZE,
            });
        }

        let mut buf = BytesMut::with_capacity(self.payload.len() + FRAME_OVERHEAD);
        buf.put_u8(SYNC_TX);
        buf.put_u8(self.payload.len() as u8);
        buf.put_u8(self.id);
        buf.put_slice(&self.payload);
        let checksum = xor_checksum(&buf);
        buf.put_u8(checksum);

        Ok(buf.freeze())
    }

    /// Decode the next frame from a receive buffer.
    ///
    /// Scans forward to the next sync byte, dropping any garbage in front of
    /// it. Consumed bytes are removed from `src`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(msg))` - a complete, valid frame was extracted
    /// - `Ok(None)` - no sync byte yet, or the frame is still incomplete;
    ///   nothing past the sync scan is consumed, wait for more bytes
    /// - `Err(ChecksumMismatch)` - a complete candidate frame failed its
    ///   checksum; the candidate is consumed so decoding can resynchronize
    ///   on the bytes after it
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChecksumMismatch`] for a corrupt candidate frame.
    pub fn decode(src: &mut BytesMut) -> Result<Option<Self>> {
        let Some(start) = src.iter().position(|&b| b == SYNC_TX || b == SYNC_RX) else {
            return Ok(None);
        };
        if start > 0 {
            src.advance(start);
        }

        if src.len() < 2 {
            return Ok(None);
        }
        let payload_len = src[1] as usize;
        let frame_len = payload_len + FRAME_OVERHEAD;
        if src.len() < frame_len {
            // Declared length runs past the buffer: the rest of the frame is
            // still in flight. Never slice ahead of the bytes we have.
            return Ok(None);
        }

        let frame = src.split_to(frame_len);
        let residue = xor_checksum(&frame);
        if residue != 0 {
            return Err(Error::ChecksumMismatch { residue });
        }

        Ok(Some(Self {
            id: frame[2],
            payload: Bytes::copy_from_slice(&frame[3..3 + payload_len]),
        }))
    }
}

impl fmt::Display for AntMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message_id() {
            Some(id) => write!(f, "{}[len={}]", id, self.payload.len()),
            None => write!(f, "Unknown(0x{:02X})[len={}]", self.id, self.payload.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::reset_system(0x4A, vec![0x00], vec![0xA4, 0x01, 0x4A, 0x00, 0xEF])]
    #[case::empty_payload(0x77, vec![], vec![0xA4, 0x00, 0x77, 0xD3])]
    fn test_encode_wire_bytes(
        #[case] id: u8,
        #[case] payload: Vec<u8>,
        #[case] expected: Vec<u8>,
    ) {
        let msg = AntMessage::from_raw(id, payload);
        let wire = msg.encode().unwrap();

        assert_eq!(&wire[..], &expected[..]);
        assert_eq!(xor_checksum(&wire), 0);
    }

    #[test]
    fn test_encode_payload_too_large() {
        let msg = AntMessage::from_raw(0x4E, vec![0u8; 256]);
        let result = msg.encode();

        assert!(matches!(result, Err(Error::PayloadTooLarge { size: 256, .. })));
    }

    #[test]
    fn test_decode_round_trip() {
        let original = AntMessage::new(MessageId::SendBroadcastData, vec![0, 1, 2, 3, 4, 5, 6, 7, 8]);
        let mut buf = BytesMut::from(&original.encode().unwrap()[..]);

        let decoded = AntMessage::decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, original);
        assert!(buf.is_empty());
    }

    #[rstest]
    #[case::empty_buffer(vec![])]
    #[case::no_sync_byte(vec![0x01, 0x02, 0x03])]
    fn test_decode_without_frame_yields_none(#[case] input: Vec<u8>) {
        let mut buf = BytesMut::from(&input[..]);
        assert!(AntMessage::decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), input.len());
    }

    #[test]
    fn test_decode_incomplete_frame_waits() {
        let msg = AntMessage::new(MessageId::SetNetworkKey, vec![0u8; 9]);
        let wire = msg.encode().unwrap();

        // Everything but the last byte: incomplete, nothing consumed past the sync scan.
        let mut buf = BytesMut::from(&wire[..wire.len() - 1]);
        assert!(AntMessage::decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), wire.len() - 1);

        // The missing byte arrives and the frame decodes.
        buf.put_u8(wire[wire.len() - 1]);
        let decoded = AntMessage::decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_decode_resync_past_garbage() {
        let msg = AntMessage::new(MessageId::OpenChannel, vec![0x00]);
        let wire = msg.encode().unwrap();

        let mut buf = BytesMut::new();
        buf.put_slice(&[0x11, 0x22, 0x33]); // line noise, no sync byte
        buf.put_slice(&wire);
        buf.put_slice(&[0x55, 0x66]); // bytes after the frame stay put

        let decoded = AntMessage::decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, msg);
        assert_eq!(&buf[..], &[0x55, 0x66]);
    }

    #[test]
    fn test_decode_checksum_mismatch_consumes_candidate() {
        let msg = AntMessage::new(MessageId::OpenChannel, vec![0x00]);
        let mut wire = BytesMut::from(&msg.encode().unwrap()[..]);
        wire[3] ^= 0x10; // corrupt the payload

        let follow_up = AntMessage::new(MessageId::CloseChannel, vec![0x00]);
        wire.put_slice(&follow_up.encode().unwrap());

        let mut buf = wire;
        let result = AntMessage::decode(&mut buf);
        assert!(matches!(result, Err(Error::ChecksumMismatch { .. })));

        // The corrupt candidate is gone; the next frame decodes cleanly.
        let decoded = AntMessage::decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, follow_up);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_multiple_frames() {
        let first = AntMessage::new(MessageId::AssignChannel, vec![0x00, 0x00, 0x00]);
        let second = AntMessage::new(MessageId::OpenChannel, vec![0x00]);

        let mut buf = BytesMut::new();
        buf.put_slice(&first.encode().unwrap());
        buf.put_slice(&second.encode().unwrap());

        assert_eq!(AntMessage::decode(&mut buf).unwrap().unwrap(), first);
        assert_eq!(AntMessage::decode(&mut buf).unwrap().unwrap(), second);
        assert!(AntMessage::decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_decode_accepts_device_sync_byte() {
        // Some firmware frames with 0xA5; the checksum is computed over
        // whatever sync byte is on the wire, so the frame still XORs to zero.
        let payload = [0x00u8, 0x01, 0x05];
        let mut wire = vec![SYNC_RX, payload.len() as u8, 0x40];
        wire.extend_from_slice(&payload);
        wire.push(xor_checksum(&wire));

        let mut buf = BytesMut::from(&wire[..]);
        let decoded = AntMessage::decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded.id(), 0x40);
        assert_eq!(decoded.payload(), &payload);
    }

    #[test]
    fn test_message_id_accessors() {
        let known = AntMessage::new(MessageId::ChannelStatus, vec![0x00, 0x02]);
        assert_eq!(known.message_id(), Some(MessageId::ChannelStatus));

        let unknown = AntMessage::from_raw(0x6F, Bytes::new());
        assert_eq!(unknown.message_id(), None);
        assert_eq!(unknown.id(), 0x6F);
    }

    #[test]
    fn test_max_payload_round_trip() {
        let payload: Vec<u8> = (0..254).map(|i| i as u8).chain([0xAB]).collect();
        assert_eq!(payload.len(), 255);

        let msg = AntMessage::from_raw(0x50, payload);
        let mut buf = BytesMut::from(&msg.encode().unwrap()[..]);
        let decoded = AntMessage::decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, msg);
    }
}
