//! Integration tests for the ANT-FS session state machine.
//!
//! Each test plays the client device over the mock transport: a beacon
//! task broadcasts the client state while a driver task reads the host's
//! commands off the air and answers them the way a real device would.

mod common;

use std::time::Duration;

use common::*;

use antler_core::Error as ProtocolError;
use antler_protocol::AuthVerdict;
use antler_session::{
    AuthPolicy, DisconnectPolicy, FsSession, SessionConfig, SessionError, SessionState,
};
use antler_transport::MockTransportHandle;

/// Device side of a successful link: acknowledge the link command.
async fn establish_link(session: &mut FsSession, handle: &MockTransportHandle) {
    let device = {
        let handle = handle.clone();
        tokio::spawn(async move {
            let (id, payload) = next_sent_frame(&handle).await;
            assert_eq!(id, 0x4F);
            // acknowledged payload: channel byte, then the link command
            assert_eq!(&payload[1..3], &[0x44, 0x02]);
            inject_tx_completed(&handle).await;
        })
    };

    session.link().await.unwrap();
    device.await.unwrap();
    assert_eq!(session.state(), SessionState::Linked);
}

/// Device side of a successful passkey exchange, accepting the key.
async fn establish_transport(session: &mut FsSession, handle: &MockTransportHandle) {
    establish_link(session, handle).await;

    let device = {
        let handle = handle.clone();
        tokio::spawn(async move {
            let command = read_sent_burst(&handle).await;
            assert_eq!(command[1], 0x04);
            inject_burst(&handle, &auth_answer(1, 7)).await;
        })
    };

    let verdict = session.authenticate(0xDEAD_BEEF).await.unwrap();
    device.await.unwrap();
    assert_eq!(verdict, AuthVerdict::Accepted);
    assert_eq!(session.state(), SessionState::Transport);
}

#[tokio::test(start_paused = true)]
async fn test_link_establishes() {
    let (mut session, handle) = mock_session();
    let beacons = spawn_beacon_task(&handle, BEACON_LINK);

    establish_link(&mut session, &handle).await;

    session.shutdown().await.unwrap();
    beacons.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_link_exhausts_attempts_against_silent_device() {
    let (mut session, handle) = mock_session();

    let result = session.link().await;
    assert!(matches!(
        result,
        Err(SessionError::RetriesExhausted {
            operation: "link",
            attempts: 5
        })
    ));
    assert_eq!(session.state(), SessionState::Disconnected);

    // without a beacon the host never put a command on the air
    assert!(handle.next_sent_timeout(Duration::from_millis(10)).await.is_none());
    session.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_link_stays_bounded_under_always_busy_client() {
    let (mut session, handle) = mock_session();
    // the client never stops beaconing Busy, so no attempt can succeed;
    // skipped beacons must still drain the per-attempt deadline
    let beacons = spawn_beacon_task(&handle, BEACON_BUSY);

    let result = session.link().await;
    assert!(matches!(
        result,
        Err(SessionError::RetriesExhausted {
            operation: "link",
            attempts: 5
        })
    ));

    session.shutdown().await.unwrap();
    beacons.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_link_skips_busy_beacons() {
    let (mut session, handle) = mock_session();
    // the client beacons busy for a while before becoming ready
    let busy = spawn_beacon_task(&handle, BEACON_BUSY);
    let ready = spawn_beacon_task_after(&handle, BEACON_LINK, Duration::from_millis(350));

    establish_link(&mut session, &handle).await;

    session.shutdown().await.unwrap();
    busy.await.unwrap();
    ready.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_link_requires_disconnected_state() {
    let (mut session, handle) = mock_session();
    let beacons = spawn_beacon_task(&handle, BEACON_LINK);

    establish_link(&mut session, &handle).await;

    let result = session.link().await;
    assert!(matches!(
        result,
        Err(SessionError::InvalidState {
            operation: "link",
            ..
        })
    ));

    session.shutdown().await.unwrap();
    beacons.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_request_serial_returns_identity() {
    let (mut session, handle) = mock_session();
    let beacons = spawn_beacon_task(&handle, BEACON_AUTH);

    establish_link(&mut session, &handle).await;

    let device = {
        let handle = handle.clone();
        tokio::spawn(async move {
            let (id, payload) = next_sent_frame(&handle).await;
            assert_eq!(id, 0x4F);
            assert_eq!(&payload[1..4], &[0x44, 0x04, 0x01]);
            inject_tx_completed(&handle).await;
            inject_burst(&handle, &serial_answer(3_141_592, "Forerunner")).await;
        })
    };

    let identity = session.request_serial().await.unwrap();
    assert_eq!(identity.unit_id, 3_141_592);
    assert_eq!(identity.unit_name, "Forerunner");

    device.await.unwrap();
    session.shutdown().await.unwrap();
    beacons.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_pair_returns_issued_key() {
    let (mut session, handle) = mock_session();
    let beacons = spawn_beacon_task(&handle, BEACON_AUTH);

    establish_link(&mut session, &handle).await;

    let device = {
        let handle = handle.clone();
        tokio::spawn(async move {
            let command = read_sent_burst(&handle).await;
            assert_eq!(&command[..3], &[0x44, 0x04, 0x02]);
            assert_eq!(&command[8..14], b"antler");
            inject_burst(&handle, &pairing_answer(1, 7, 0x1122_3344_5566_7788)).await;
        })
    };

    let outcome = session.pair().await.unwrap();
    assert_eq!(outcome.verdict, AuthVerdict::Accepted);
    assert_eq!(outcome.key, 0x1122_3344_5566_7788);

    device.await.unwrap();
    session.shutdown().await.unwrap();
    beacons.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_authenticate_strict_rejection_fails() {
    let (mut session, handle) = session_with_config(SessionConfig {
        auth_policy: AuthPolicy::Strict,
        ..SessionConfig::default()
    });
    let beacons = spawn_beacon_task(&handle, BEACON_AUTH);

    establish_link(&mut session, &handle).await;

    let device = {
        let handle = handle.clone();
        tokio::spawn(async move {
            let command = read_sent_burst(&handle).await;
            assert_eq!(command[1], 0x04);
            inject_burst(&handle, &auth_answer(2, 7)).await;
        })
    };

    let result = session.authenticate(0xBAD).await;
    assert!(matches!(
        result,
        Err(SessionError::Rejected {
            operation: "authenticate"
        })
    ));
    assert_eq!(session.state(), SessionState::Linked);

    device.await.unwrap();
    session.shutdown().await.unwrap();
    beacons.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_authenticate_advisory_survives_silence() {
    let (mut session, handle) = mock_session();
    let beacons = spawn_beacon_task(&handle, BEACON_AUTH);

    establish_link(&mut session, &handle).await;

    // device beacons but never answers the passkey exchange
    let verdict = session.authenticate(0xBAD).await.unwrap();
    assert_eq!(verdict, AuthVerdict::NotApplicable);
    assert_eq!(session.state(), SessionState::Transport);

    session.shutdown().await.unwrap();
    beacons.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_best_effort_swallows_exhaustion() {
    let (mut session, _handle) = mock_session();

    // silent device, default policy
    session.disconnect().await.unwrap();
    assert_eq!(session.state(), SessionState::Disconnected);
    session.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_required_surfaces_exhaustion() {
    let (mut session, _handle) = session_with_config(SessionConfig {
        disconnect_policy: DisconnectPolicy::Required,
        ..SessionConfig::default()
    });

    let result = session.disconnect().await;
    assert!(matches!(
        result,
        Err(SessionError::RetriesExhausted {
            operation: "disconnect",
            ..
        })
    ));
    session.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_download_terminates_at_file_size() {
    let (mut session, handle) = mock_session();
    let beacons = spawn_beacon_task(&handle, BEACON_TRANSPORT);

    establish_transport(&mut session, &handle).await;

    let file: Vec<u8> = (0u8..20).collect();
    let device = {
        let handle = handle.clone();
        let file = file.clone();
        tokio::spawn(async move {
            // first request: initial flag, zero offset and seed
            let request = read_sent_burst(&handle).await;
            assert_eq!(&request[..2], &[0x44, 0x09]);
            assert_eq!(u16::from_le_bytes([request[2], request[3]]), 5);
            assert_eq!(request[9], 1);
            let first_seed = crc_of(&file[..10]);
            inject_burst(
                &handle,
                &download_packet(10, 0, 20, &file[..10], first_seed),
            )
            .await;

            // second request continues at offset 10 with the carried seed
            let request = read_sent_burst(&handle).await;
            assert_eq!(u32::from_le_bytes(request[4..8].try_into().unwrap()), 10);
            assert_eq!(request[9], 0);
            assert_eq!(
                u16::from_le_bytes([request[10], request[11]]),
                first_seed
            );
            inject_burst(
                &handle,
                &download_packet(10, 10, 20, &file[10..], crc_of(&file)),
            )
            .await;
        })
    };

    let result = session.download(5).await.unwrap();
    assert_eq!(&result.data[..], &file[..]);
    assert_eq!(result.file_size, 20);
    assert!(result.crc_matched);

    device.await.unwrap();
    // the loop stopped at file_size: no third request went out
    assert!(handle.next_sent_timeout(Duration::from_millis(200)).await.is_none());

    session.shutdown().await.unwrap();
    beacons.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_download_rejects_short_payload() {
    let (mut session, handle) = mock_session();
    let beacons = spawn_beacon_task(&handle, BEACON_TRANSPORT);

    establish_transport(&mut session, &handle).await;

    let device = {
        let handle = handle.clone();
        tokio::spawn(async move {
            let request = read_sent_burst(&handle).await;
            assert_eq!(request[1], 0x09);
            // header declares 10 payload bytes, packet carries 5 and no footer
            let mut packet = download_packet(10, 0, 20, &[0xEE; 10], 0);
            packet.truncate(24 + 5);
            inject_burst(&handle, &packet).await;
        })
    };

    let result = session.download(5).await;
    assert!(matches!(
        result,
        Err(SessionError::Protocol(ProtocolError::Truncated {
            what: "download data",
            ..
        }))
    ));

    device.await.unwrap();
    session.shutdown().await.unwrap();
    beacons.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_download_refusal_is_reported() {
    let (mut session, handle) = mock_session();
    let beacons = spawn_beacon_task(&handle, BEACON_TRANSPORT);

    establish_transport(&mut session, &handle).await;

    let device = {
        let handle = handle.clone();
        tokio::spawn(async move {
            read_sent_burst(&handle).await;
            // header-only packet with response 1 = data does not exist
            let mut packet = download_packet(0, 0, 0, &[], 0);
            packet[10] = 0x01;
            packet.truncate(24);
            inject_burst(&handle, &packet).await;
        })
    };

    let result = session.download(42).await;
    assert!(matches!(
        result,
        Err(SessionError::DownloadRefused { .. })
    ));

    device.await.unwrap();
    session.shutdown().await.unwrap();
    beacons.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_download_requires_transport_state() {
    let (mut session, _handle) = mock_session();

    let result = session.download(1).await;
    assert!(matches!(
        result,
        Err(SessionError::InvalidState {
            operation: "download",
            ..
        })
    ));
    session.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_download_directory_parses_entries() {
    let (mut session, handle) = mock_session();
    let beacons = spawn_beacon_task(&handle, BEACON_TRANSPORT);

    establish_transport(&mut session, &handle).await;

    // directory: 16-byte header + two 16-byte records (activity and course)
    let mut directory = vec![0u8; 16];
    directory[0] = 1;
    directory[1] = 16;
    for (index, record_type) in [(1u16, 4u8), (2, 6)] {
        let mut record = vec![0u8; 16];
        record[..2].copy_from_slice(&index.to_le_bytes());
        record[2] = 0x80;
        record[3] = record_type;
        directory.extend_from_slice(&record);
    }

    let device = {
        let handle = handle.clone();
        let directory = directory.clone();
        tokio::spawn(async move {
            let request = read_sent_burst(&handle).await;
            assert_eq!(u16::from_le_bytes([request[2], request[3]]), 0);
            let size = directory.len() as u32;
            inject_burst(
                &handle,
                &download_packet(size, 0, size, &directory, crc_of(&directory)),
            )
            .await;
        })
    };

    let parsed = session.download_directory().await.unwrap();
    assert_eq!(parsed.entries.len(), 2);
    assert_eq!(parsed.activity_indices(), vec![1]);

    device.await.unwrap();
    session.shutdown().await.unwrap();
    beacons.await.unwrap();
}
