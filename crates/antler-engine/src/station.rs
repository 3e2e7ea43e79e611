//! The station: the foreground handle to an ANT radio.
//!
//! An [`AntStation`] owns the ingest pipeline and exposes the send and wait
//! primitives everything above builds on: issue a channel command and insist
//! on its acknowledgement, send acknowledged or burst data, and wait for the
//! next broadcast or reassembled burst. There is exactly one consumer of the
//! event stream, so waits are plain loops over one receiver.

use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use antler_core::constants::{BURST_PACKET_INTERVAL, RESET_SETTLE_TIME};
use antler_core::types::{EventCode, MessageId};
use antler_protocol::{AntMessage, Beacon, burst_packets, messages};
use antler_transport::AnyTransport;

use crate::error::{EngineError, Result};
use crate::event::AntEvent;
use crate::pipeline::Pipeline;
use crate::state::SharedState;

/// Tunables for a station.
#[derive(Debug, Clone)]
pub struct StationConfig {
    /// How long to wait for a command acknowledgement or transfer result.
    pub response_timeout: Duration,

    /// How long to wait for broadcast or burst data. Searches can be slow,
    /// so this is much longer than the response timeout.
    pub data_timeout: Duration,

    /// Depth of the event channel between the parser and the station.
    pub event_capacity: usize,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            response_timeout: Duration::from_secs(5),
            data_timeout: Duration::from_secs(30),
            event_capacity: 256,
        }
    }
}

/// Foreground handle to a running radio pipeline.
///
/// # Examples
///
/// ```no_run
/// use antler_engine::AntStation;
/// use antler_transport::{AnyTransport, SerialTransport};
/// use antler_protocol::messages;
///
/// # async fn example() -> antler_engine::Result<()> {
/// let transport = SerialTransport::open("/dev/ttyUSB0").await?;
/// let mut station = AntStation::new(AnyTransport::Serial(transport));
///
/// station.reset().await?;
/// station.command(messages::open_channel(0)).await?;
///
/// let (payload, beacon) = station.wait_for_broadcast().await?;
/// println!("got {} bytes, beacon: {:?}", payload.len(), beacon);
///
/// station.shutdown().await
/// # }
/// ```
pub struct AntStation {
    outbound_tx: mpsc::Sender<Bytes>,
    events: mpsc::Receiver<AntEvent>,
    state: SharedState,
    cancel: tokio_util::sync::CancellationToken,
    tasks: tokio::task::JoinSet<Result<()>>,
    config: StationConfig,
}

impl AntStation {
    /// Start a station with default configuration.
    pub fn new(transport: AnyTransport) -> Self {
        Self::with_config(transport, StationConfig::default())
    }

    /// Start a station with explicit configuration.
    pub fn with_config(transport: AnyTransport, config: StationConfig) -> Self {
        let pipeline = Pipeline::spawn(transport, config.event_capacity);

        Self {
            outbound_tx: pipeline.outbound_tx,
            events: pipeline.event_rx,
            state: pipeline.state,
            cancel: pipeline.cancel,
            tasks: pipeline.tasks,
            config,
        }
    }

    /// Shared protocol state, readable without consuming events.
    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// The configuration this station was started with.
    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    /// Queue one frame for transmission.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Stopped`] if the pipeline is gone.
    pub async fn send(&self, message: &AntMessage) -> Result<()> {
        let bytes = message.encode()?;
        trace!(id = format_args!("0x{:02X}", message.id()), "Queueing frame");
        self.outbound_tx
            .send(bytes)
            .await
            .map_err(|_| EngineError::Stopped)
    }

    /// Send a channel command and insist on `RESPONSE_NO_ERROR`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CommandRejected`] if the radio answers with
    /// any other code, and [`EngineError::Timeout`] if it does not answer.
    pub async fn command(&mut self, message: AntMessage) -> Result<()> {
        let id = message.id();
        self.send(&message).await?;
        self.wait_for_response(id).await
    }

    /// Wait for the response frame acknowledging command `id`.
    pub async fn wait_for_response(&mut self, id: u8) -> Result<()> {
        let deadline = Instant::now() + self.config.response_timeout;

        loop {
            match self.next_event(deadline, "command response").await? {
                AntEvent::Response { id: responded, code } if responded == id => {
                    return if code == EventCode::ResponseNoError {
                        Ok(())
                    } else {
                        warn!(id = format_args!("0x{id:02X}"), %code, "Command rejected");
                        Err(EngineError::CommandRejected { id, code })
                    };
                }
                other => trace!(?other, "Skipping while waiting for response"),
            }
        }
    }

    /// Wait for the next broadcast, discarding anything stale first.
    ///
    /// Broadcasts queued before this call describe the past, so they are
    /// drained; a queued transfer failure still fails the wait, because the
    /// caller's previous operation evidently went wrong.
    ///
    /// # Errors
    ///
    /// [`EngineError::TransferFailed`] on an RF failure event,
    /// [`EngineError::Timeout`] after the data timeout.
    pub async fn wait_for_broadcast(&mut self) -> Result<(Bytes, Option<Beacon>)> {
        while let Ok(event) = self.events.try_recv() {
            if let Some(code) = event.is_transfer_failure() {
                return Err(EngineError::TransferFailed { code });
            }
            trace!(?event, "Discarding stale event");
        }

        let deadline = Instant::now() + self.config.data_timeout;
        loop {
            match self.next_event(deadline, "broadcast").await? {
                AntEvent::Broadcast { payload, beacon } => return Ok((payload, beacon)),
                event => {
                    if let Some(code) = event.is_transfer_failure() {
                        return Err(EngineError::TransferFailed { code });
                    }
                }
            }
        }
    }

    /// Wait for the next complete burst transfer.
    ///
    /// Unlike [`AntStation::wait_for_broadcast`], nothing is pre-drained: a
    /// burst that raced ahead of the caller is still the burst they want.
    pub async fn wait_for_burst(&mut self) -> Result<Bytes> {
        let deadline = Instant::now() + self.config.data_timeout;
        loop {
            match self.next_event(deadline, "burst transfer").await? {
                AntEvent::Burst { data } => return Ok(data),
                event => {
                    if let Some(code) = event.is_transfer_failure() {
                        return Err(EngineError::TransferFailed { code });
                    }
                }
            }
        }
    }

    /// Send acknowledged data and wait for the transfer result.
    ///
    /// # Errors
    ///
    /// [`EngineError::TransferFailed`] if the radio reports the transfer
    /// failed, [`EngineError::Timeout`] if no result arrives.
    pub async fn send_acknowledged(&mut self, channel: u8, payload: &[u8]) -> Result<()> {
        self.send(&messages::send_acknowledged_data(channel, payload))
            .await?;

        let deadline = Instant::now() + self.config.response_timeout;
        loop {
            match self.next_event(deadline, "acknowledged transfer result").await? {
                AntEvent::Response { code: EventCode::TransferTxCompleted, .. } => return Ok(()),
                event => {
                    if let Some(code) = event.is_transfer_failure() {
                        return Err(EngineError::TransferFailed { code });
                    }
                }
            }
        }
    }

    /// Send a burst transfer, paced one packet per interval.
    ///
    /// Does not wait for a transfer result; ANT-FS answers a burst with a
    /// burst, which the caller collects with [`AntStation::wait_for_burst`].
    pub async fn send_burst(&mut self, channel: u8, payload: &[u8]) -> Result<()> {
        let packets = burst_packets(channel, payload);
        debug!(channel, packets = packets.len(), "Sending burst");

        for packet in &packets {
            self.send(packet).await?;
            tokio::time::sleep(BURST_PACKET_INTERVAL).await;
        }
        Ok(())
    }

    /// Request a message from the radio and return its payload.
    ///
    /// Used for channel status, channel id, and capabilities queries.
    pub async fn request(&mut self, channel: u8, requested: MessageId) -> Result<Bytes> {
        self.send(&messages::request_message(channel, requested))
            .await?;

        let deadline = Instant::now() + self.config.response_timeout;
        loop {
            match self.next_event(deadline, "requested message").await? {
                AntEvent::Message { id, payload } if id == requested.as_u8() => {
                    return Ok(payload);
                }
                other => trace!(?other, "Skipping while waiting for requested message"),
            }
        }
    }

    /// Reset the radio and let it settle.
    ///
    /// Everything queued before the reset describes a dead configuration,
    /// so pending events are discarded afterwards.
    pub async fn reset(&mut self) -> Result<()> {
        debug!("Resetting radio");
        self.send(&messages::reset_system()).await?;
        tokio::time::sleep(RESET_SETTLE_TIME).await;

        while let Ok(event) = self.events.try_recv() {
            trace!(?event, "Discarding pre-reset event");
        }
        Ok(())
    }

    /// Stop the pipeline and release the transport.
    pub async fn shutdown(mut self) -> Result<()> {
        debug!("Shutting down station");
        self.cancel.cancel();

        while let Some(result) = self.tasks.join_next().await {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => debug!(error = %e, "Pipeline task ended with error"),
                Err(e) if e.is_cancelled() => {}
                Err(e) => warn!(error = %e, "Pipeline task panicked"),
            }
        }
        Ok(())
    }

    async fn next_event(
        &mut self,
        deadline: Instant,
        waiting_for: &'static str,
    ) -> Result<AntEvent> {
        let started = Instant::now();
        match tokio::time::timeout_at(deadline, self.events.recv()).await {
            Ok(Some(event)) => Ok(event),
            Ok(None) => Err(EngineError::Stopped),
            Err(_) => Err(EngineError::Timeout {
                waiting_for,
                duration_ms: started.elapsed().as_millis() as u64,
            }),
        }
    }
}
