//! Ingest pipeline: transport I/O task and frame parser task.
//!
//! Two tasks turn a byte transport into an event stream:
//!
//! ```text
//! ┌───────────┐  raw bytes   ┌───────────┐  AntEvent   ┌─────────────┐
//! │ I/O task  │─────────────►│ Parser    │────────────►│ AntStation  │
//! │ (owns the │   (mpsc)     │ task      │   (mpsc)    │ wait        │
//! │ transport)│◄─────────────│           │             │ primitives  │
//! └───────────┘  outbound    └───────────┘             └─────────────┘
//! ```
//!
//! The I/O task owns the transport outright: it alternates between flushing
//! queued outbound frames and polling for inbound bytes. The parser task
//! accumulates bytes, decodes frames (resynchronizing across corruption),
//! reassembles bursts, and keeps [`SharedState`] current. A transport error
//! cancels the token so both tasks and the station observe the loss.

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use antler_core::types::{ChannelState, EventCode, MessageId};
use antler_protocol::{AntMessage, Beacon, BurstAssembler};
use antler_transport::{AnyTransport, AntTransport};

use crate::error::Result;
use crate::event::AntEvent;
use crate::state::SharedState;

/// How long one receive poll blocks before outbound frames get a turn.
const READ_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Raw-byte channel depth between the I/O and parser tasks.
const RAW_CHANNEL_CAPACITY: usize = 64;

/// Move bytes between the transport and the parser until cancelled.
///
/// Outbound frames are flushed before every receive poll, so a queued
/// command waits at most one poll interval. Any transport error cancels the
/// token and ends the task.
pub(crate) async fn io_task(
    mut transport: AnyTransport,
    mut outbound_rx: mpsc::Receiver<Bytes>,
    raw_tx: mpsc::Sender<Bytes>,
    cancel: CancellationToken,
) -> Result<()> {
    debug!(transport = transport.description(), "I/O task started");

    let result = loop {
        if cancel.is_cancelled() {
            break Ok(());
        }

        let mut send_error = None;
        while let Ok(data) = outbound_rx.try_recv() {
            trace!(len = data.len(), "Writing frame bytes");
            if let Err(e) = transport.send(data).await {
                warn!(error = %e, "Transport send failed");
                cancel.cancel();
                send_error = Some(e);
                break;
            }
        }
        if let Some(e) = send_error {
            break Err(e.into());
        }

        match transport.receive(READ_POLL_INTERVAL).await {
            Ok(bytes) if bytes.is_empty() => {}
            Ok(bytes) => {
                if raw_tx.send(bytes).await.is_err() {
                    // parser is gone, nothing left to feed
                    break Ok(());
                }
            }
            Err(e) => {
                warn!(error = %e, "Transport receive failed");
                cancel.cancel();
                break Err(e.into());
            }
        }
    };

    if let Err(e) = transport.close().await {
        debug!(error = %e, "Transport close reported an error");
    }
    debug!("I/O task stopped");
    result
}

/// Decode raw bytes into [`AntEvent`]s until the byte stream ends.
pub(crate) async fn parser_task(
    mut raw_rx: mpsc::Receiver<Bytes>,
    event_tx: mpsc::Sender<AntEvent>,
    state: SharedState,
    cancel: CancellationToken,
) -> Result<()> {
    let mut buf = BytesMut::new();
    let mut assembler = BurstAssembler::new();

    loop {
        let bytes = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            bytes = raw_rx.recv() => match bytes {
                Some(bytes) => bytes,
                None => break,
            },
        };
        buf.extend_from_slice(&bytes);

        loop {
            match AntMessage::decode(&mut buf) {
                Ok(Some(message)) => {
                    if let Some(event) = classify(message, &state, &mut assembler)
                        && event_tx.send(event).await.is_err()
                    {
                        // station dropped its receiver
                        return Ok(());
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    // the corrupt candidate was consumed; keep scanning
                    warn!(error = %e, "Dropping corrupt frame");
                }
            }
        }
    }

    Ok(())
}

/// Turn one decoded frame into an event, updating shared state on the way.
///
/// Returns `None` for frames that only feed an accumulator (burst packets
/// before the last one) or are too short to mean anything.
fn classify(
    message: AntMessage,
    state: &SharedState,
    assembler: &mut BurstAssembler,
) -> Option<AntEvent> {
    let payload = message.payload();

    match message.message_id() {
        Some(MessageId::ResponseEvent) => {
            if payload.len() < 3 {
                warn!(len = payload.len(), "Short response frame");
                return None;
            }
            let id = payload[1];
            let code = EventCode::from_u8(payload[2]);
            trace!(id = format_args!("0x{id:02X}"), %code, "Response");
            state.update(|s| s.last_response = Some((id, code)));
            Some(AntEvent::Response { id, code })
        }

        Some(MessageId::SendBroadcastData) | Some(MessageId::SendAcknowledgedData) => {
            if payload.len() < 2 {
                warn!(len = payload.len(), "Short data frame");
                return None;
            }
            let data = message.into_payload().slice(1..);
            let beacon = Beacon::parse(&data).ok();
            if let Some(beacon) = beacon {
                state.update(|s| {
                    s.client_state = beacon.client_state;
                    s.last_beacon = Some(beacon);
                });
            }
            Some(AntEvent::Broadcast {
                payload: data,
                beacon,
            })
        }

        Some(MessageId::SendBurstTransferPacket) => match assembler.push(payload) {
            Ok(Some(data)) => {
                trace!(len = data.len(), "Burst complete");
                Some(AntEvent::Burst { data })
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Malformed burst packet");
                assembler.clear();
                None
            }
        },

        Some(MessageId::ChannelStatus) => {
            if payload.len() >= 2 {
                let channel_state = ChannelState::from_status_byte(payload[1]);
                state.update(|s| s.channel_state = Some(channel_state));
            }
            Some(AntEvent::Message {
                id: message.id(),
                payload: message.into_payload(),
            })
        }

        _ => Some(AntEvent::Message {
            id: message.id(),
            payload: message.into_payload(),
        }),
    }
}

/// Channel depths and construction for the pipeline; used by the station.
pub(crate) struct Pipeline {
    pub outbound_tx: mpsc::Sender<Bytes>,
    pub event_rx: mpsc::Receiver<AntEvent>,
    pub state: SharedState,
    pub cancel: CancellationToken,
    pub tasks: tokio::task::JoinSet<Result<()>>,
}

impl Pipeline {
    /// Spawn the I/O and parser tasks over the given transport.
    pub(crate) fn spawn(transport: AnyTransport, event_capacity: usize) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::channel(RAW_CHANNEL_CAPACITY);
        let (raw_tx, raw_rx) = mpsc::channel(RAW_CHANNEL_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel(event_capacity);

        let state = SharedState::new();
        let cancel = CancellationToken::new();

        let mut tasks = tokio::task::JoinSet::new();
        tasks.spawn(io_task(
            transport,
            outbound_rx,
            raw_tx,
            cancel.clone(),
        ));
        tasks.spawn(parser_task(
            raw_rx,
            event_tx,
            state.clone(),
            cancel.clone(),
        ));

        Self {
            outbound_tx,
            event_rx,
            state,
            cancel,
            tasks,
        }
    }
}
