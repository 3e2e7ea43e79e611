//! Typed builders for the ANT channel command set.
//!
//! Each function produces the complete [`AntMessage`] for one host-to-device
//! command, with the payload laid out exactly as the radio expects it: the
//! channel number first, followed by command parameters, multi-byte integers
//! little-endian. The byte layouts here are part of the external contract.

use bytes::{BufMut, BytesMut};

use antler_core::types::{ChannelType, MessageId};

use crate::frame::AntMessage;

/// Reset the ANT system.
///
/// The dongle answers this with a startup message, not a command response;
/// the caller sleeps for the settle window instead of awaiting one.
pub fn reset_system() -> AntMessage {
    AntMessage::new(MessageId::ResetSystem, vec![0x00])
}

/// Install an 8-byte network key on a network number.
pub fn set_network_key(network: u8, key: &[u8; 8]) -> AntMessage {
    let mut data = BytesMut::with_capacity(9);
    data.put_u8(network);
    data.put_slice(key);
    AntMessage::new(MessageId::SetNetworkKey, data.freeze())
}

/// Assign a channel with a type on a network.
pub fn assign_channel(channel: u8, channel_type: ChannelType, network: u8) -> AntMessage {
    AntMessage::new(
        MessageId::AssignChannel,
        vec![channel, channel_type.as_u8(), network],
    )
}

/// Release a channel assignment.
pub fn unassign_channel(channel: u8) -> AntMessage {
    AntMessage::new(MessageId::UnassignChannel, vec![channel])
}

/// Set the channel message period in 1/32768 s units.
pub fn set_channel_period(channel: u8, period: u16) -> AntMessage {
    let mut data = BytesMut::with_capacity(3);
    data.put_u8(channel);
    data.put_u16_le(period);
    AntMessage::new(MessageId::SetChannelPeriod, data.freeze())
}

/// Set the search timeout in 2.5 s units (0x00 immediate, 0xFF unlimited).
pub fn set_channel_search_timeout(channel: u8, timeout: u8) -> AntMessage {
    AntMessage::new(MessageId::SetChannelSearchTimeout, vec![channel, timeout])
}

/// Set the RF frequency as an offset in MHz from 2400 MHz.
pub fn set_channel_rf_freq(channel: u8, frequency: u8) -> AntMessage {
    AntMessage::new(MessageId::SetChannelRadioFreq, vec![channel, frequency])
}

/// Set the channel search waveform.
pub fn set_search_waveform(channel: u8, waveform: u16) -> AntMessage {
    let mut data = BytesMut::with_capacity(3);
    data.put_u8(channel);
    data.put_u16_le(waveform);
    AntMessage::new(MessageId::SetSearchWaveform, data.freeze())
}

/// Set the channel id (device number, type, transmission type).
///
/// Device number 0 and type 0 are wildcards that match any master. The
/// pairing flag rides in the top bit of the device-type byte.
pub fn set_channel_id(
    channel: u8,
    device_number: u16,
    pairing: bool,
    device_type: u8,
    transmission_type: u8,
) -> AntMessage {
    let type_byte = (device_type & 0x7F) | if pairing { 0x80 } else { 0x00 };
    let mut data = BytesMut::with_capacity(5);
    data.put_u8(channel);
    data.put_u16_le(device_number);
    data.put_u8(type_byte);
    data.put_u8(transmission_type);
    AntMessage::new(MessageId::SetChannelId, data.freeze())
}

/// Open an assigned channel.
pub fn open_channel(channel: u8) -> AntMessage {
    AntMessage::new(MessageId::OpenChannel, vec![channel])
}

/// Close an open channel.
pub fn close_channel(channel: u8) -> AntMessage {
    AntMessage::new(MessageId::CloseChannel, vec![channel])
}

/// Ask the device to send back a specific message (status, id, capabilities).
pub fn request_message(channel: u8, requested: MessageId) -> AntMessage {
    AntMessage::new(MessageId::RequestMessage, vec![channel, requested.as_u8()])
}

/// Send a payload as acknowledged data on a channel.
///
/// Acknowledged data fits one frame; the device reports the outcome with a
/// channel event, not a command response.
pub fn send_acknowledged_data(channel: u8, payload: &[u8]) -> AntMessage {
    let mut data = BytesMut::with_capacity(1 + payload.len());
    data.put_u8(channel);
    data.put_slice(payload);
    AntMessage::new(MessageId::SendAcknowledgedData, data.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_system_wire_bytes() {
        let wire = reset_system().encode().unwrap();
        assert_eq!(&wire[..], &[0xA4, 0x01, 0x4A, 0x00, 0xEF]);
    }

    #[test]
    fn test_set_network_key_layout() {
        let key = [0xA8, 0xA4, 0x23, 0xB9, 0xF5, 0x5E, 0x63, 0xC1];
        let msg = set_network_key(0, &key);

        assert_eq!(msg.message_id(), Some(MessageId::SetNetworkKey));
        assert_eq!(msg.payload()[0], 0);
        assert_eq!(&msg.payload()[1..], &key);
    }

    #[test]
    fn test_set_channel_period_little_endian() {
        let msg = set_channel_period(0, 4096);
        assert_eq!(msg.payload(), &[0x00, 0x00, 0x10]);
    }

    #[test]
    fn test_set_search_waveform_little_endian() {
        let msg = set_search_waveform(0, 83);
        assert_eq!(msg.payload(), &[0x00, 83, 0x00]);
    }

    #[test]
    fn test_set_channel_id_pairing_bit() {
        let plain = set_channel_id(0, 0x1234, false, 0x78, 0);
        assert_eq!(plain.payload(), &[0x00, 0x34, 0x12, 0x78, 0x00]);

        let pairing = set_channel_id(0, 0x1234, true, 0x78, 0);
        assert_eq!(pairing.payload()[3], 0xF8);
    }

    #[test]
    fn test_assign_channel_receive_type() {
        let msg = assign_channel(0, ChannelType::Receive, 0);
        assert_eq!(msg.payload(), &[0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_request_message_payload() {
        let msg = request_message(0, MessageId::ChannelStatus);
        assert_eq!(msg.payload(), &[0x00, 0x52]);
    }

    #[test]
    fn test_send_acknowledged_data_prepends_channel() {
        let msg = send_acknowledged_data(0, &[0x44, 0x02, 50, 4, 1, 0, 0, 0]);
        assert_eq!(msg.payload().len(), 9);
        assert_eq!(msg.payload()[0], 0);
        assert_eq!(msg.payload()[1], 0x44);
    }
}
