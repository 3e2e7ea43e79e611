//! Common test utilities for session integration tests.
//!
//! Builds a session over a mock transport and provides the pieces a test
//! needs to play the device side: beacon broadcasting, reading the host's
//! commands off the air, and injecting the answer bursts and RF events a
//! real client would produce.

#![allow(dead_code)]

use std::time::Duration;

use antler_engine::{AntStation, StationConfig};
use antler_protocol::{AntMessage, BurstHeader, Crc16, burst_packets};
use antler_session::{FsSession, SessionConfig};
use antler_transport::{AnyTransport, MockTransport, MockTransportHandle};

/// A client beacon in the Link state.
pub const BEACON_LINK: u8 = 0x00;
/// A client beacon in the Authentication state.
pub const BEACON_AUTH: u8 = 0x01;
/// A client beacon in the Transport state.
pub const BEACON_TRANSPORT: u8 = 0x02;
/// A client beacon in the Busy state.
pub const BEACON_BUSY: u8 = 0x03;

/// Build a session over a mock transport with the given config.
pub fn session_with_config(config: SessionConfig) -> (FsSession, MockTransportHandle) {
    let (transport, handle) = MockTransport::new();
    let station = AntStation::with_config(
        AnyTransport::Mock(transport),
        StationConfig {
            response_timeout: Duration::from_secs(2),
            data_timeout: Duration::from_secs(10),
            event_capacity: 256,
        },
    );
    (FsSession::new(station, config), handle)
}

/// Build a session with default configuration.
pub fn mock_session() -> (FsSession, MockTransportHandle) {
    session_with_config(SessionConfig::default())
}

/// Inject one encoded frame.
pub async fn inject_frame(handle: &MockTransportHandle, id: u8, payload: &[u8]) {
    let bytes = AntMessage::from_raw(id, payload.to_vec()).encode().unwrap();
    handle.inject(&bytes).await;
}

/// Inject one ANT-FS beacon broadcast with the given client state nibble.
pub async fn inject_beacon(handle: &MockTransportHandle, state: u8) {
    // 8 Hz period + data available, passkey-and-pairing auth, host serial 1
    let payload = [0x00, 0x43, 0x24, state, 0x03, 0x01, 0x00, 0x00, 0x00];
    inject_frame(handle, 0x4E, &payload).await;
}

/// Spawn a device task that beacons every 100 ms until the transport drops.
pub fn spawn_beacon_task(handle: &MockTransportHandle, state: u8) -> tokio::task::JoinHandle<()> {
    spawn_beacon_task_after(handle, state, Duration::ZERO)
}

/// Like [`spawn_beacon_task`], but silent for `delay` first.
pub fn spawn_beacon_task_after(
    handle: &MockTransportHandle,
    state: u8,
    delay: Duration,
) -> tokio::task::JoinHandle<()> {
    let handle = handle.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let payload = [0x00, 0x43, 0x24, state, 0x03, 0x01, 0x00, 0x00, 0x00];
        let frame = AntMessage::from_raw(0x4E, payload.to_vec()).encode().unwrap();
        while handle.try_inject(&frame).await {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    })
}

/// Inject a channel-event response frame (`EVENT_*` codes on pseudo-id 1).
pub async fn inject_channel_event(handle: &MockTransportHandle, code: u8) {
    inject_frame(handle, 0x40, &[0x00, 0x01, code]).await;
}

/// Inject the `EVENT_TRANSFER_TX_COMPLETED` that closes an acknowledged send.
pub async fn inject_tx_completed(handle: &MockTransportHandle) {
    inject_channel_event(handle, 0x05).await;
}

/// Inject a complete client burst, split into wire packets.
pub async fn inject_burst(handle: &MockTransportHandle, data: &[u8]) {
    for packet in burst_packets(0, data) {
        handle.inject(&packet.encode().unwrap()).await;
    }
}

/// Read the next frame the host sent, returning `(id, payload)`.
pub async fn next_sent_frame(handle: &MockTransportHandle) -> (u8, Vec<u8>) {
    let bytes = handle.next_sent().await.expect("host stopped sending");
    assert_eq!(bytes[0], 0xA4, "host frames start with the TX sync byte");
    let len = bytes[1] as usize;
    (bytes[2], bytes[3..3 + len].to_vec())
}

/// Read one whole burst the host sent, reassembling packet payloads.
pub async fn read_sent_burst(handle: &MockTransportHandle) -> Vec<u8> {
    let mut data = Vec::new();
    loop {
        let (id, payload) = next_sent_frame(handle).await;
        assert_eq!(id, 0x50, "expected a burst packet from the host");
        let header = BurstHeader::from_u8(payload[0]);
        data.extend_from_slice(&payload[1..]);
        if header.last {
            return data;
        }
    }
}

/// Build one download answer packet: beacon echo, header, body, footer.
///
/// The footer carries `seed`, which for a well-behaved device is the CRC-16
/// of the file up to and including this packet's body.
pub fn download_packet(remain: u32, offset: u32, file_size: u32, body: &[u8], seed: u16) -> Vec<u8> {
    assert_eq!(body.len(), remain as usize);

    let mut packet = Vec::with_capacity(24 + body.len() + 8);
    // beacon prefix (Transport state)
    packet.extend_from_slice(&[0x43, 0x24, BEACON_TRANSPORT, 0x03, 0x01, 0x00, 0x00, 0x00]);
    packet.push(0x44);
    packet.push(0x89); // response to download request
    packet.push(0x00); // DownloadResponse::Ok
    packet.push(0x00);
    packet.extend_from_slice(&remain.to_le_bytes());
    packet.extend_from_slice(&offset.to_le_bytes());
    packet.extend_from_slice(&file_size.to_le_bytes());
    packet.extend_from_slice(body);
    packet.extend_from_slice(&[0, 0, 0, 0, 0, 0]);
    packet.extend_from_slice(&seed.to_le_bytes());
    packet
}

/// CRC-16 of a file prefix, for building consistent packet footers.
pub fn crc_of(data: &[u8]) -> u16 {
    let mut crc = Crc16::new();
    crc.update(data);
    crc.value()
}

/// Build a 16-byte authenticate-answer head.
pub fn auth_answer(verdict: u8, unit_id: u32) -> Vec<u8> {
    let mut answer = vec![0u8; 16];
    answer[4..8].copy_from_slice(&1u32.to_le_bytes());
    answer[10] = verdict;
    answer[12..16].copy_from_slice(&unit_id.to_le_bytes());
    answer
}

/// Build a 32-byte serial-number answer with the given name.
pub fn serial_answer(unit_id: u32, name: &str) -> Vec<u8> {
    let mut answer = auth_answer(0, unit_id);
    let mut field = [0u8; 16];
    field[..name.len()].copy_from_slice(name.as_bytes());
    answer.extend_from_slice(&field);
    answer
}

/// Build a 24-byte pairing answer issuing `key`.
pub fn pairing_answer(verdict: u8, unit_id: u32, key: u64) -> Vec<u8> {
    let mut answer = auth_answer(verdict, unit_id);
    answer.extend_from_slice(&key.to_le_bytes());
    answer
}
