//! Tokio codec for ANT message framing.
//!
//! [`AntCodec`] adapts the [`AntMessage`](crate::frame::AntMessage) framing
//! rules to tokio-util's [`Decoder`]/[`Encoder`] traits so the serial byte
//! stream can be driven through `Framed` adapters where convenient. The
//! ingest pipeline uses the same [`AntMessage::decode`] function directly on
//! its own buffer; this codec is the framed-stream view of it.
//!
//! A checksum mismatch is returned as an error, but the corrupt candidate
//! frame has already been consumed from the buffer: callers that keep the
//! stream alive (the pipeline does) resynchronize on the next call.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use antler_core::{Error, Result};

use crate::frame::AntMessage;

/// Codec implementing ANT sync/length/id/checksum framing.
///
/// # Example
///
/// ```
/// use bytes::BytesMut;
/// use tokio_util::codec::Decoder;
/// use antler_protocol::codec::AntCodec;
///
/// let mut codec = AntCodec::new();
/// let mut buffer = BytesMut::from(&[0xA4u8, 0x01, 0x4A, 0x00, 0xEF][..]);
///
/// let msg = codec.decode(&mut buffer).unwrap().unwrap();
/// assert_eq!(msg.id(), 0x4A);
/// ```
#[derive(Debug, Default)]
pub struct AntCodec {
    _priv: (),
}

impl AntCodec {
    /// Create a new codec.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for AntCodec {
    type Item = AntMessage;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        AntMessage::decode(src)
    }
}

impl Encoder<AntMessage> for AntCodec {
    type Error = Error;

    fn encode(&mut self, item: AntMessage, dst: &mut BytesMut) -> Result<()> {
        let wire = item.encode()?;
        dst.extend_from_slice(&wire);
        Ok(())
    }
}
